//! Error taxonomy shared by every codec.
//!
//! Each conversion returns either its result or a single [`ConversionError`].
//! Nothing is retried internally and no partial output accompanies an error.

/// Stable classification of a [`ConversionError`], for hosts that report
/// failures as error codes rather than messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseFailure,
    SchemaViolation,
    UnsupportedShape,
    MissingConfiguration,
    InvalidConfiguration,
    EncodingFailure,
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Malformed input text (bad quoting, unusable header, invalid JSON)
    #[error("Could not parse input at line {line}: {reason}")]
    ParseFailure { line: usize, reason: String },

    /// A record does not have the shape the target format requires
    #[error("Schema violation on field '{field}': {reason}")]
    SchemaViolation { field: String, reason: String },

    /// A value cannot be represented in the target format
    #[error("Cannot convert {shape} in field '{field}' to {target}")]
    UnsupportedShape {
        field: String,
        shape: &'static str,
        target: &'static str,
    },

    /// A configuration parameter the conversion needs was not supplied
    #[error("Missing configuration parameter: {parameter}")]
    MissingConfiguration { parameter: &'static str },

    /// A configuration parameter was supplied but is unusable
    #[error("Invalid configuration parameter {parameter}: {reason}")]
    InvalidConfiguration {
        parameter: &'static str,
        reason: String,
    },

    /// Bytes could not be decoded from, or text encoded to, the configured encoding
    #[error("Encoding failure ({encoding}): {reason}")]
    EncodingFailure {
        encoding: &'static str,
        reason: String,
    },

    /// Failure reading the source or writing the sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the conversion between records
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConversionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ParseFailure { .. } => ErrorCode::ParseFailure,
            Self::SchemaViolation { .. } => ErrorCode::SchemaViolation,
            Self::UnsupportedShape { .. } => ErrorCode::UnsupportedShape,
            Self::MissingConfiguration { .. } => ErrorCode::MissingConfiguration,
            Self::InvalidConfiguration { .. } => ErrorCode::InvalidConfiguration,
            Self::EncodingFailure { .. } | Self::Io(_) => ErrorCode::EncodingFailure,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }

    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            line,
            reason: reason.into(),
        }
    }

    pub fn invalid_config(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConversionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_report_as_encoding_failures() {
        let err = ConversionError::from(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "truncated",
        ));
        assert_eq!(err.code(), ErrorCode::EncodingFailure);
    }

    #[test]
    fn test_error_messages() {
        let err = ConversionError::parse(3, "unterminated quote");
        assert_eq!(
            err.to_string(),
            "Could not parse input at line 3: unterminated quote"
        );

        let err = ConversionError::UnsupportedShape {
            field: "Baz".to_string(),
            shape: "nested entity",
            target: "IDX",
        };
        assert_eq!(err.to_string(), "Cannot convert nested entity in field 'Baz' to IDX");
        assert_eq!(err.code(), ErrorCode::UnsupportedShape);
    }
}
