use axum::http::HeaderValue;
use jsonwebtoken::Algorithm;

use crate::auth::jwt::JwtConfig;

/// A configuration variable was missing or unparsable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// Everything except the database URL and the JWT settings has a default
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    /// Credentials are allowed, so a wildcard is rejected at load time.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks to drain on shutdown (default: `5`).
    pub shutdown_timeout_secs: u64,
    pub database_url: String,
    /// Pool size (default: `10`).
    pub database_max_connections: u32,
    /// JWT token configuration (secret, algorithm, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Required | Default                 |
    /// |----------------------------|----------|-------------------------|
    /// | `HOST`                     | no       | `0.0.0.0`               |
    /// | `PORT`                     | no       | `8000`                  |
    /// | `CORS_ORIGINS`             | no       | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`     | no       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | no       | `5`                     |
    /// | `DATABASE_URL`             | **yes**  | --                      |
    /// | `DATABASE_MAX_CONNECTIONS` | no       | `10`                    |
    /// | `JWT_SECRET`               | **yes**  | --                      |
    /// | `JWT_ALGORITHM`            | **yes**  | --                      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | **yes**  | --                      |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | **yes**  | --                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let cors_origins = vars
            .or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_origin)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parse_or("PORT", 8000)?,
            cors_origins,
            request_timeout_secs: vars.parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: vars.parse_or("SHUTDOWN_TIMEOUT_SECS", 5)?,
            database_url: vars.required("DATABASE_URL")?,
            database_max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt: jwt_from_vars(&vars)?,
        })
    }
}

/// Upper bounds keep the token lifetimes well inside what `chrono::Duration`
/// can represent.
const MAX_ACCESS_EXPIRY_MINS: i64 = 24 * 60;
const MAX_REFRESH_EXPIRY_DAYS: i64 = 10 * 365;

fn parse_origin(origin: &str) -> Result<HeaderValue, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var: "CORS_ORIGINS",
        value: origin.to_string(),
        reason: reason.to_string(),
    };
    if origin == "*" {
        return Err(invalid("wildcard origin cannot be used with credentials"));
    }
    HeaderValue::from_str(origin).map_err(|e| invalid(&e.to_string()))
}

fn jwt_from_vars(vars: &Vars<'_>) -> Result<JwtConfig, ConfigError> {
    let secret = vars.required("JWT_SECRET")?;

    let raw_algorithm = vars.required("JWT_ALGORITHM")?;
    let algorithm = match raw_algorithm.parse::<Algorithm>() {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
        _ => {
            return Err(ConfigError::Invalid {
                var: "JWT_ALGORITHM",
                value: raw_algorithm,
                reason: "expected one of HS256, HS384, HS512".into(),
            })
        }
    };

    let access_token_expiry_mins: i64 = vars.parse_required("JWT_ACCESS_EXPIRY_MINS")?;
    let refresh_token_expiry_days: i64 = vars.parse_required("JWT_REFRESH_EXPIRY_DAYS")?;
    for (var, value, max) in [
        (
            "JWT_ACCESS_EXPIRY_MINS",
            access_token_expiry_mins,
            MAX_ACCESS_EXPIRY_MINS,
        ),
        (
            "JWT_REFRESH_EXPIRY_DAYS",
            refresh_token_expiry_days,
            MAX_REFRESH_EXPIRY_DAYS,
        ),
    ] {
        if !(1..=max).contains(&value) {
            return Err(ConfigError::Invalid {
                var,
                value: value.to_string(),
                reason: format!("must be between 1 and {max}"),
            });
        }
    }

    Ok(JwtConfig {
        secret,
        algorithm,
        access_token_expiry_mins,
        refresh_token_expiry_days,
    })
}

struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.get(var).ok_or(ConfigError::Missing(var))
    }

    fn parse_value<T>(var: &'static str, value: String) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn parse_or<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(var) {
            Some(value) => Self::parse_value(var, value),
            None => Ok(default),
        }
    }

    fn parse_required<T>(&self, var: &'static str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        Self::parse_value(var, self.required(var)?)
    }
}
