/// Input validators for request payloads
///
/// Length limits follow the column sizes in the migrations.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::Role;
use crate::error::ValidationError;

const MAX_PHONE_LENGTH: usize = 20;
const MAX_FULLNAME_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 256;
const MAX_PATIENT_AGE: i32 = 150;

pub const FUNDRAISER_STATUSES: &[&str] = &["pending", "approved", "rejected"];

lazy_static! {
    // Optional leading '+', then 7 to 15 digits (E.164 allows at most 15)
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

/// Validates a phone number, the stable login identifier
pub fn is_valid_phone_number(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("phone_number".to_string()));
    }

    if trimmed.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong("phone_number".to_string(), MAX_PHONE_LENGTH));
    }

    if !PHONE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("phone_number".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name
pub fn is_valid_fullname(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("fullname".to_string()));
    }

    if trimmed.chars().count() > MAX_FULLNAME_LENGTH {
        return Err(ValidationError::TooLong("fullname".to_string(), MAX_FULLNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("fullname".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Registration password policy
///
/// The hasher only looks at the first 72 bytes; the upper bound here just
/// keeps request bodies sane.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password".to_string(), MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

pub fn parse_role(role: Option<&str>) -> Result<Role, ValidationError> {
    match role {
        None => Ok(Role::default()),
        Some(value) => value.trim().parse(),
    }
}

pub fn parse_fundraiser_status(status: &str) -> Result<&'static str, ValidationError> {
    FUNDRAISER_STATUSES
        .iter()
        .copied()
        .find(|s| *s == status)
        .ok_or_else(|| ValidationError::InvalidFormat("status".to_string()))
}

/// Required free-text field: must contain something besides whitespace
pub fn require_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Money amounts must be finite and strictly positive
pub fn require_positive_amount(field: &str, amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::OutOfRange(field.to_string()));
    }
    Ok(amount)
}

pub fn is_valid_patient_age(age: i32) -> Result<i32, ValidationError> {
    if !(0..=MAX_PATIENT_AGE).contains(&age) {
        return Err(ValidationError::OutOfRange("patient_age".to_string()));
    }
    Ok(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phone_numbers() {
        assert_eq!(is_valid_phone_number("+15551234567").unwrap(), "+15551234567");
        assert_eq!(is_valid_phone_number(" 9876543210 ").unwrap(), "9876543210");
        assert!(is_valid_phone_number("1234567").is_ok());
    }

    #[test]
    fn test_invalid_phone_numbers() {
        assert!(matches!(
            is_valid_phone_number(""),
            Err(ValidationError::EmptyField(_))
        ));
        assert!(is_valid_phone_number("123456").is_err());
        assert!(is_valid_phone_number("+1234567890123456").is_err());
        assert!(is_valid_phone_number("555-123-4567").is_err());
        assert!(is_valid_phone_number("++15551234567").is_err());
        assert!(is_valid_phone_number("phone").is_err());
        assert!(matches!(
            is_valid_phone_number(&"1".repeat(21)),
            Err(ValidationError::TooLong(_, 20))
        ));
    }

    #[test]
    fn test_fullname_validation() {
        assert_eq!(is_valid_fullname("  Asha Rao ").unwrap(), "Asha Rao");
        assert!(is_valid_fullname("   ").is_err());
        assert!(is_valid_fullname("bad\u{0000}name").is_err());
        assert!(is_valid_fullname(&"x".repeat(101)).is_err());
        assert!(is_valid_fullname(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn test_password_policy() {
        assert!(is_valid_password("secret123").is_ok());
        assert!(matches!(
            is_valid_password("short"),
            Err(ValidationError::TooShort(_, 6))
        ));
        assert!(is_valid_password(&"a".repeat(256)).is_ok());
        assert!(is_valid_password(&"a".repeat(257)).is_err());
    }

    #[test]
    fn test_role_parsing_defaults_to_user() {
        assert_eq!(parse_role(None).unwrap(), Role::User);
        assert_eq!(parse_role(Some("admin")).unwrap(), Role::Admin);
        assert!(parse_role(Some("owner")).is_err());
    }

    #[test]
    fn test_fundraiser_status() {
        assert_eq!(parse_fundraiser_status("approved").unwrap(), "approved");
        assert_eq!(parse_fundraiser_status("pending").unwrap(), "pending");
        assert_eq!(parse_fundraiser_status("rejected").unwrap(), "rejected");
        assert!(parse_fundraiser_status("APPROVED").is_err());
        assert!(parse_fundraiser_status("live").is_err());
    }

    #[test]
    fn test_amounts() {
        assert_eq!(require_positive_amount("amount", 500.0).unwrap(), 500.0);
        assert!(require_positive_amount("amount", 0.0).is_err());
        assert!(require_positive_amount("amount", -10.0).is_err());
        assert!(require_positive_amount("amount", f64::NAN).is_err());
        assert!(require_positive_amount("amount", f64::INFINITY).is_err());
    }

    #[test]
    fn test_required_text_and_age() {
        assert_eq!(require_text("location", " Pune ").unwrap(), "Pune");
        assert!(require_text("location", "\t").is_err());
        assert!(is_valid_patient_age(42).is_ok());
        assert!(is_valid_patient_age(-1).is_err());
        assert!(is_valid_patient_age(151).is_err());
    }
}
