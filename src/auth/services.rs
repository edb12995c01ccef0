use lazy_static::lazy_static;
use regex::Regex;

use crate::error::RegisterError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// At least 8 characters with an uppercase letter, a lowercase letter, a
/// digit and something that is neither letter nor digit.
pub(crate) fn is_strong_password(password: &str) -> bool {
    if password.chars().count() < 8 {
        return false;
    }
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(char::is_numeric);
    let has_special = password.chars().any(|c| !c.is_alphanumeric());
    has_upper && has_lower && has_digit && has_special
}

/// Checks that don't need the account map, in the order registration
/// reports them. The duplicate-username check sits between `fields` and
/// `format` and is done by the caller.
pub(crate) fn check_fields(username: &str, password: &str, email: &str) -> Result<(), RegisterError> {
    if username.is_empty() || password.is_empty() || email.is_empty() {
        return Err(RegisterError::MissingFields);
    }
    Ok(())
}

pub(crate) fn check_format(password: &str, email: &str) -> Result<(), RegisterError> {
    if !is_valid_email(email) {
        return Err(RegisterError::InvalidEmail);
    }
    if !is_strong_password(password) {
        return Err(RegisterError::WeakPassword);
    }
    Ok(())
}
