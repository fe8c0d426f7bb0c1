use validator::ValidateEmail;

use crate::services::error::AccessError;

const NAME_MAX_LEN: usize = 100;

/// Validate an email address shape before it reaches storage.
pub fn validate_email(email: &str) -> Result<(), AccessError> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(AccessError::Validation(
            "not a valid email address".to_string(),
        ))
    }
}

/// Validate a person or organization display name.
pub fn validate_name(name: &str) -> Result<(), AccessError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AccessError::Validation("name must not be empty".to_string()));
    }
    if trimmed.len() > NAME_MAX_LEN {
        return Err(AccessError::Validation(format!(
            "name must be at most {} characters",
            NAME_MAX_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_email() {
        assert!(validate_email("someone@example.org").is_ok());
    }

    #[test]
    fn rejects_missing_domain() {
        assert!(validate_email("someone@").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn rejects_blank_name() {
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn accepts_reasonable_name() {
        assert!(validate_name("Nordstadt Fairteiler").is_ok());
    }
}
