use thiserror::Error;

pub const MIN_CHARS: usize = 10;
pub const MAX_CHARS: usize = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text is too short ({len} characters, minimum {min})", min = MIN_CHARS)]
    TooShort { len: usize },

    #[error("text is too long ({len} characters, maximum {max})", max = MAX_CHARS)]
    TooLong { len: usize },

    #[error("text is blank")]
    Blank,
}

/// Checks a text before submission and returns the trimmed text to send.
///
/// Length is counted in characters over the text as typed; the text must also
/// contain something other than whitespace.
pub fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let len = text.chars().count();
    if len < MIN_CHARS {
        return Err(ValidationError::TooShort { len });
    }
    if len > MAX_CHARS {
        return Err(ValidationError::TooLong { len });
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds_inclusive() {
        assert!(validate_text(&"a".repeat(MIN_CHARS)).is_ok());
        assert!(validate_text(&"a".repeat(MAX_CHARS)).is_ok());
        assert_eq!(validate_text("Hello world"), Ok("Hello world"));
    }

    #[test]
    fn rejects_outside_bounds() {
        assert_eq!(
            validate_text(&"a".repeat(MIN_CHARS - 1)),
            Err(ValidationError::TooShort { len: MIN_CHARS - 1 })
        );
        assert_eq!(
            validate_text(&"a".repeat(MAX_CHARS + 1)),
            Err(ValidationError::TooLong { len: MAX_CHARS + 1 })
        );
        assert_eq!(validate_text(""), Err(ValidationError::TooShort { len: 0 }));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 10 characters, 20 bytes.
        let text = "ññññññññññ";
        assert_eq!(text.len(), 20);
        assert!(validate_text(text).is_ok());
        assert!(validate_text(&"é".repeat(MAX_CHARS)).is_ok());
    }

    #[test]
    fn rejects_whitespace_only() {
        assert_eq!(validate_text(&" ".repeat(20)), Err(ValidationError::Blank));
    }

    #[test]
    fn returns_trimmed_text() {
        assert_eq!(validate_text("   Hello world  \n"), Ok("Hello world"));
    }
}
