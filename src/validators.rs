/// Input validators
///
/// Email and password shape checks for account routes, plus chirp body rules:
/// a length cap and replacement of a fixed set of profane words.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSORED: &str = "****";

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Checks password length in characters. The password is never trimmed.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length == 0 {
        return Err(ValidationError::EmptyField("password"));
    }
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Validates a chirp body and returns it with profane words censored
pub fn is_valid_chirp(body: &str) -> Result<String, ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyField("body"));
    }
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("body", MAX_CHIRP_LENGTH));
    }
    Ok(clean_profanity(body))
}

/// Replaces whole space-separated profane words, ignoring case.
///
/// Words with attached punctuation (`"kerfuffle!"`) are left as they are.
pub fn clean_profanity(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                CENSORED
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_is_trimmed() {
        assert_eq!(
            is_valid_email("  walt@breakingbad.com ").unwrap(),
            "walt@breakingbad.com"
        );
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            is_valid_email(&too_long),
            Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH))
        );
        assert_eq!(
            is_valid_email("a@b"),
            Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH))
        );
        assert_eq!(is_valid_email("   "), Err(ValidationError::EmptyField("email")));
    }

    #[test]
    fn test_password_length() {
        assert!(is_valid_password("04234abc").is_ok());
        assert!(is_valid_password(&"p".repeat(128)).is_ok());
        assert_eq!(
            is_valid_password("short"),
            Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH))
        );
        assert_eq!(
            is_valid_password(&"p".repeat(129)),
            Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH))
        );
        assert_eq!(is_valid_password(""), Err(ValidationError::EmptyField("password")));
    }

    #[test]
    fn test_password_counts_characters_not_bytes() {
        // 8 characters, 16 bytes
        assert!(is_valid_password("ééééééé1").is_ok());
    }

    #[test]
    fn test_chirp_length_cap() {
        assert!(is_valid_chirp(&"a".repeat(140)).is_ok());
        assert_eq!(
            is_valid_chirp(&"a".repeat(141)),
            Err(ValidationError::TooLong("body", MAX_CHIRP_LENGTH))
        );
        assert_eq!(is_valid_chirp(""), Err(ValidationError::EmptyField("body")));
    }

    #[test]
    fn test_clean_profanity() {
        assert_eq!(
            clean_profanity("This is a kerfuffle opinion I need to share with the world"),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(clean_profanity("Sharbert and FORNAX"), "**** and ****");
        assert_eq!(clean_profanity("what a kerfuffle!"), "what a kerfuffle!");
        assert_eq!(clean_profanity("nothing to see"), "nothing to see");
    }

    #[test]
    fn test_validation_error_becomes_invalid_input() {
        let err = AppError::from(ValidationError::InvalidFormat("email"));
        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "email has invalid format"));
    }
}
