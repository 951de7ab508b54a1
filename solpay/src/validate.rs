//! Client-side form validation.
//!
//! These checks run before any network request; a failure here is shown
//! inline and never reaches the backend.

use crate::error::{PayError, Result};

/// Check that an email has the shape `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    fn chunk_ok(s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| !c.is_whitespace() && c != '@')
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    chunk_ok(local) && chunk_ok(host) && chunk_ok(tld)
}

/// Validate login input: both fields present.
pub fn validate_login(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(PayError::Validation(
            "Please enter both email and password".into(),
        ));
    }
    Ok(())
}

/// Validate registration input: all fields present, email shape, username
/// 3-20 characters, password at least 6 characters and matching its
/// confirmation.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    password_confirm: &str,
) -> Result<()> {
    if username.is_empty() || email.is_empty() || password.is_empty() || password_confirm.is_empty()
    {
        return Err(PayError::Validation("Please fill in all fields".into()));
    }
    if !is_valid_email(email) {
        return Err(PayError::Validation(
            "Please enter a valid email address".into(),
        ));
    }
    let username_len = username.chars().count();
    if !(3..=20).contains(&username_len) {
        return Err(PayError::Validation(
            "Username must be between 3 and 20 characters".into(),
        ));
    }
    if password.chars().count() < 6 {
        return Err(PayError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    if password != password_confirm {
        return Err(PayError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid_shapes() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("user.name@example.co.uk"));
        assert!(is_valid_email("u+tag@sub.example.com"));
    }

    #[test]
    fn test_email_invalid_shapes() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plain"));
        assert!(!is_valid_email("no-at.example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@domain."));
        assert!(!is_valid_email("has space@example.com"));
        assert!(!is_valid_email("user@exa mple.com"));
        assert!(!is_valid_email("two@@example.com"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(validate_login("", "secret").is_err());
        assert!(validate_login("a@b.c", "").is_err());
        assert!(validate_login("a@b.c", "secret").is_ok());
    }

    #[test]
    fn test_registration_username_bounds() {
        let err = validate_registration("ab", "a@b.c", "secret1", "secret1").unwrap_err();
        assert!(err.to_string().contains("between 3 and 20"));

        let long = "x".repeat(21);
        assert!(validate_registration(&long, "a@b.c", "secret1", "secret1").is_err());

        assert!(validate_registration("abc", "a@b.c", "secret1", "secret1").is_ok());
        let max = "x".repeat(20);
        assert!(validate_registration(&max, "a@b.c", "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_registration_password_rules() {
        let err = validate_registration("alice", "a@b.c", "short", "short").unwrap_err();
        assert!(err.to_string().contains("at least 6"));

        let err = validate_registration("alice", "a@b.c", "secret1", "secret2").unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_registration_rejects_bad_email_before_other_checks() {
        let err = validate_registration("alice", "not-an-email", "secret1", "secret1").unwrap_err();
        assert!(err.to_string().contains("valid email"));
    }
}
