//! Coarse user-agent classification for login sessions.
//!
//! Parsing is done by `woothee`; its results are folded into three labels:
//! device type, browser family and OS family. Anything the parser does not
//! recognise becomes `"Other"` / [`DeviceType::Unknown`].

use serde::Serialize;
use woothee::parser::Parser;

/// Device class recorded on a login session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Labels derived from one user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
}

const OTHER: &str = "Other";
/// Placeholder `woothee` reports for fields it could not determine.
const UNKNOWN: &str = "UNKNOWN";

/// Classify a user-agent string. Returns `None` for a missing or blank value.
pub fn classify(user_agent: Option<&str>) -> Option<ClientProfile> {
    let ua = user_agent.map(str::trim).filter(|s| !s.is_empty())?;

    let Some(parsed) = Parser::new().parse(ua) else {
        return Some(ClientProfile {
            device_type: DeviceType::Unknown,
            browser: OTHER.to_string(),
            os: OTHER.to_string(),
        });
    };

    let os = os_family(&parsed.os);
    Some(ClientProfile {
        device_type: device_type(ua, &parsed.category, os),
        browser: browser_family(&parsed.name).to_string(),
        os: os.to_string(),
    })
}

fn browser_family(name: &str) -> &str {
    match name {
        "" | UNKNOWN => OTHER,
        "Internet Explorer" => "IE",
        other => other,
    }
}

/// `woothee` reports versioned Windows names and Apple devices as the OS;
/// collapse them to the family.
fn os_family(os: &str) -> &str {
    match os {
        "" | UNKNOWN => OTHER,
        "iPhone" | "iPad" | "iPod" => "iOS",
        "Mac OSX" => "Mac OS X",
        "ChromeOS" => "Chrome OS",
        os if os.starts_with("Windows Phone") => "Windows Phone",
        os if os.starts_with("Windows") => "Windows",
        other => other,
    }
}

/// `woothee` files tablets under `smartphone`, so they are split out first.
fn device_type(ua: &str, category: &str, os: &str) -> DeviceType {
    let tablet = ua.contains("iPad")
        || ua.contains("Tablet")
        || (os == "Android" && !ua.contains("Mobile"));
    if tablet {
        return DeviceType::Tablet;
    }
    match category {
        "smartphone" | "mobilephone" => DeviceType::Mobile,
        "pc" => DeviceType::Desktop,
        _ => DeviceType::Unknown,
    }
}
