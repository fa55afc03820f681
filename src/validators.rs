/// Input validators for registration and login payloads
///
/// Each validator trims its input, enforces length limits and format, and
/// returns the normalized value that should be stored or looked up.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_EMAIL_LOCAL_PART_LENGTH: usize = 64;
const MAX_USERNAME_LENGTH: usize = 255;
const MAX_PHONE_LENGTH: usize = 15;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ()-]+$").unwrap();
}

/// Normalizes an email address for storage and lookup: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an email address and returns its normalized form
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email(email);

    if normalized.is_empty() {
        return Err(ValidationError::BlankField("Email address cannot be blank"));
    }

    if normalized.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(&normalized) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    if let Some(at_pos) = normalized.find('@') {
        if at_pos > MAX_EMAIL_LOCAL_PART_LENGTH {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(normalized)
}

/// Validates a username and returns it trimmed
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::BlankField("Username cannot be blank"));
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username", MAX_USERNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("username"));
    }

    Ok(trimmed.to_string())
}

/// Validates an optional phone number. Blank input is treated as absent.
pub fn is_valid_phone(phone: Option<&str>) -> Result<Option<String>, ValidationError> {
    let trimmed = match phone.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(p) => p,
    };

    if trimmed.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong("phone", MAX_PHONE_LENGTH));
    }

    if !PHONE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("phone"));
    }

    Ok(Some(trimmed.to_string()))
}
