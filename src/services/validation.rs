//! Input validation shared by registration and profile mutation.

use regex::Regex;
use std::sync::OnceLock;

pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.len() < 2 {
        return Err("Name must be at least 2 characters long".to_string());
    }
    if trimmed.len() > 100 {
        return Err("Name must be at most 100 characters long".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }
    Ok(())
}

/// Length window check reused by complaint/discussion/group text fields.
pub fn validate_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), String> {
    let len = value.trim().len();
    if len < min {
        return Err(format!("{} must be at least {} characters long", field, min));
    }
    if len > max {
        return Err(format!("{} must be at most {} characters long", field, max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_email() {
        assert!(validate_email("citizen@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.domain.rw").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@no-tld").is_err());
    }

    #[test]
    fn password_length_window() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long-enough-1").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn length_window_trims() {
        assert!(validate_length("Title", "   ab   ", 5, 200).is_err());
        assert!(validate_length("Title", "Water outage", 5, 200).is_ok());
    }
}
