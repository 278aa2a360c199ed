//! Validation of user messages and generation parameters

use std::fmt;

use crate::domain::DomainError;

/// Maximum length of the message body, in characters
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Maximum length of the optional context, in characters
pub const MAX_CONTEXT_LENGTH: usize = 5_000;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

pub const MIN_MAX_TOKENS: u32 = 1;
pub const MAX_MAX_TOKENS: u32 = 4_000;

/// Message and parameter validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Message body is empty or whitespace
    EmptyContent,
    /// Message body exceeds the maximum length
    ContentTooLong { length: usize, max: usize },
    /// Context exceeds the maximum length
    ContextTooLong { length: usize, max: usize },
    /// Temperature out of valid range
    InvalidTemperature { value: f32, min: f32, max: f32 },
    /// Max tokens out of valid range
    InvalidMaxTokens { value: u32, min: u32, max: u32 },
    /// Model name is empty
    EmptyModel,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "Message cannot be empty"),
            Self::ContentTooLong { length, max } => {
                write!(f, "Message too long: {} characters (max {})", length, max)
            }
            Self::ContextTooLong { length, max } => {
                write!(f, "Context too long: {} characters (max {})", length, max)
            }
            Self::InvalidTemperature { value, min, max } => {
                write!(
                    f,
                    "Invalid temperature {}: must be between {} and {}",
                    value, min, max
                )
            }
            Self::InvalidMaxTokens { value, min, max } => {
                write!(
                    f,
                    "Invalid max_tokens {}: must be between {} and {}",
                    value, min, max
                )
            }
            Self::EmptyModel => write!(f, "Model name cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::invalid_request(err.to_string())
    }
}

pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    let length = content.chars().count();
    if length > MAX_CONTENT_LENGTH {
        return Err(ValidationError::ContentTooLong {
            length,
            max: MAX_CONTENT_LENGTH,
        });
    }

    Ok(())
}

pub fn validate_context(context: &str) -> Result<(), ValidationError> {
    let length = context.chars().count();
    if length > MAX_CONTEXT_LENGTH {
        return Err(ValidationError::ContextTooLong {
            length,
            max: MAX_CONTEXT_LENGTH,
        });
    }

    Ok(())
}

/// Validate temperature value
pub fn validate_temperature(temp: f32) -> Result<(), ValidationError> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temp) {
        return Err(ValidationError::InvalidTemperature {
            value: temp,
            min: MIN_TEMPERATURE,
            max: MAX_TEMPERATURE,
        });
    }

    Ok(())
}

/// Validate max_tokens value
pub fn validate_max_tokens(max_tokens: u32) -> Result<(), ValidationError> {
    if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&max_tokens) {
        return Err(ValidationError::InvalidMaxTokens {
            value: max_tokens,
            min: MIN_MAX_TOKENS,
            max: MAX_MAX_TOKENS,
        });
    }

    Ok(())
}

pub fn validate_model(model: &str) -> Result<(), ValidationError> {
    if model.trim().is_empty() {
        return Err(ValidationError::EmptyModel);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content() {
        assert!(validate_content("Hello").is_ok());
        assert!(validate_content(&"a".repeat(MAX_CONTENT_LENGTH)).is_ok());

        assert_eq!(validate_content(""), Err(ValidationError::EmptyContent));
        assert_eq!(validate_content("   \n"), Err(ValidationError::EmptyContent));
        assert!(matches!(
            validate_content(&"a".repeat(MAX_CONTENT_LENGTH + 1)),
            Err(ValidationError::ContentTooLong { length: 10_001, .. })
        ));
    }

    #[test]
    fn test_content_length_counts_characters() {
        // 10k multi-byte characters are still within the limit
        let content = "é".repeat(MAX_CONTENT_LENGTH);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn test_validate_context() {
        assert!(validate_context("").is_ok());
        assert!(validate_context(&"c".repeat(MAX_CONTEXT_LENGTH)).is_ok());
        assert!(validate_context(&"c".repeat(MAX_CONTEXT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(validate_temperature(0.0).is_ok());
        assert!(validate_temperature(0.7).is_ok());
        assert!(validate_temperature(2.0).is_ok());
        assert!(validate_temperature(-0.1).is_err());
        assert!(validate_temperature(3.5).is_err());
        assert!(validate_temperature(f32::NAN).is_err());
    }

    #[test]
    fn test_validate_max_tokens() {
        assert!(validate_max_tokens(1).is_ok());
        assert!(validate_max_tokens(4000).is_ok());
        assert!(validate_max_tokens(0).is_err());
        assert!(validate_max_tokens(4001).is_err());
    }

    #[test]
    fn test_error_converts_to_invalid_request() {
        let err: DomainError = ValidationError::EmptyContent.into();
        assert!(matches!(err, DomainError::InvalidRequest { .. }));
        assert_eq!(err.to_string(), "Invalid request: Message cannot be empty");
    }
}
