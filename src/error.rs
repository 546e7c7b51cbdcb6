//! Error types for proportion tests.

use thiserror::Error;

/// Errors raised synchronously by the hypothesis tests in this crate.
///
/// Every variant describes a problem with the caller's inputs; none of them are
/// retryable without changing those inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProportionError {
    /// A parameter was outside its valid domain.
    #[error("invalid parameter `{name}` = {value}: {constraint}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        constraint: &'static str,
    },

    /// The requested computation needs more data than was supplied.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl ProportionError {
    pub(crate) fn invalid(
        name: &'static str,
        value: impl ToString,
        constraint: &'static str,
    ) -> Self {
        ProportionError::InvalidParameter {
            name,
            value: value.to_string(),
            constraint,
        }
    }

    /// Name of the offending parameter, if this is an `InvalidParameter` error.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            ProportionError::InvalidParameter { name, .. } => Some(name),
            ProportionError::InsufficientData(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProportionError>;
