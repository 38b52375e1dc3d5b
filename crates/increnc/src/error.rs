//! Error types for estimator construction and reconfiguration.
//!
//! Per-sample faults are not errors: they are latched in
//! [`FaultStatus`](crate::FaultStatus) and polled by the caller. Everything
//! here is raised at initialization or when a setter is called outside the
//! periodic path.

/// Errors raised while configuring an estimator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncoderError {
    /// A configuration field failed validation.
    #[error("invalid configuration: '{field}' {reason}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The injected tick source reported properties the estimator cannot use.
    #[error("unsupported tick source: {reason}")]
    InvalidSource {
        /// Why the source was rejected
        reason: String,
    },

    /// Configuration text could not be deserialized.
    #[error("failed to parse encoder configuration: {0}")]
    Parse(String),
}

impl EncoderError {
    /// Create an invalid configuration error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        EncoderError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Create an unsupported source error.
    pub fn invalid_source(reason: impl Into<String>) -> Self {
        EncoderError::InvalidSource {
            reason: reason.into(),
        }
    }

    /// Returns true if the error stems from configuration values or text.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EncoderError::InvalidConfig { .. } | EncoderError::Parse(_)
        )
    }

    /// Name of the rejected configuration field, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EncoderError::InvalidConfig { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EncoderError {
    fn from(err: serde_json::Error) -> Self {
        EncoderError::Parse(err.to_string())
    }
}

/// Result type for estimator configuration.
pub type EncoderResult<T> = Result<T, EncoderError>;
