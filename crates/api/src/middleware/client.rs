//! Client metadata extractor.
//!
//! Behind a proxy the socket address is the proxy's, so the client IP is
//! taken from forwarding headers in a fixed order of trust.

use std::convert::Infallible;
use std::net::IpAddr;

use axum::extract::FromRequestParts;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use gatehouse_events::ClientInfo;

/// Headers consulted for the client IP, first valid address wins.
/// `X-Forwarded-For` may hold a chain; only its first entry is used.
const IP_HEADERS: [&str; 4] = [
    "x-real-ip",
    "cf-connecting-ip",
    "true-client-ip",
    "x-forwarded-for",
];

/// Client IP and user agent of the current request. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta(ClientInfo {
            ip_address: client_ip(&parts.headers),
            user_agent: header_str(&parts.headers, USER_AGENT.as_str()),
        }))
    }
}

/// Resolve the client IP from forwarding headers.
///
/// A value that does not parse as an IPv4 or IPv6 address is skipped, and
/// the address is stored in its canonical form.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    IP_HEADERS.iter().find_map(|name| {
        let value = header_str(headers, name)?;
        let first = value.split(',').next()?.trim();
        match first.parse::<IpAddr>() {
            Ok(ip) => Some(ip.to_string()),
            Err(_) => {
                tracing::debug!(header = *name, "Ignoring malformed client IP header");
                None
            }
        }
    })
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn no_headers_means_unknown() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn real_ip_takes_precedence() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.1"),
            ("cf-connecting-ip", "203.0.113.2"),
            ("x-real-ip", "203.0.113.3"),
        ]);
        assert_eq!(client_ip(&h).as_deref(), Some("203.0.113.3"));
    }

    #[test]
    fn cloudflare_before_true_client_ip() {
        let h = headers(&[
            ("true-client-ip", "198.51.100.7"),
            ("cf-connecting-ip", "198.51.100.8"),
        ]);
        assert_eq!(client_ip(&h).as_deref(), Some("198.51.100.8"));
    }

    #[test]
    fn forwarded_for_uses_first_entry() {
        let h = headers(&[("x-forwarded-for", " 192.0.2.10 , 10.0.0.1, 10.0.0.2")]);
        assert_eq!(client_ip(&h).as_deref(), Some("192.0.2.10"));
    }

    #[test]
    fn malformed_value_falls_through_to_next_header() {
        let junk = "not-an-ip-".repeat(6);
        let mut h = headers(&[("x-forwarded-for", "192.0.2.12")]);
        h.insert("x-real-ip", HeaderValue::from_str(&junk).unwrap());
        assert_eq!(client_ip(&h).as_deref(), Some("192.0.2.12"));

        let mut h = HeaderMap::new();
        h.insert("x-real-ip", HeaderValue::from_str(&junk).unwrap());
        assert_eq!(client_ip(&h), None);
    }

    #[test]
    fn ipv6_is_accepted_and_fits_the_column() {
        let h = headers(&[("x-real-ip", "2001:0db8:0000:0000:0000:ff00:0042:8329")]);
        let ip = client_ip(&h).unwrap();
        assert_eq!(ip, "2001:db8::ff00:42:8329");
        assert!(ip.len() <= 45);
    }

    #[test]
    fn blank_header_falls_through() {
        let h = headers(&[("x-real-ip", "  "), ("x-forwarded-for", "192.0.2.11")]);
        assert_eq!(client_ip(&h).as_deref(), Some("192.0.2.11"));
    }
}
