//! Input validation for account fields.
//!
//! All helpers return [`CoreError::Validation`] naming the offending field.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Maximum accepted password length in bytes. Argon2 accepts more, but
/// nothing legitimate needs it and it bounds hashing cost per request.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Maximum email length per RFC 5321.
pub const MAX_EMAIL_LEN: usize = 254;

/// Maximum length of the free-form account status label.
pub const MAX_STATUS_LEN: usize = 50;

/// Status assigned to accounts created without one.
pub const DEFAULT_STATUS: &str = "active";

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
        return Err(CoreError::Validation(format!(
            "email '{email}' is not a valid address"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.is_empty() {
        return Err(CoreError::Validation("password must not be empty".into()));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    let len = status.trim().chars().count();
    if len == 0 || status.chars().count() > MAX_STATUS_LEN {
        return Err(CoreError::Validation(format!(
            "status must be between 1 and {MAX_STATUS_LEN} characters"
        )));
    }
    Ok(())
}
