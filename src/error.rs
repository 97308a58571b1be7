//! Error taxonomy for the calculator core
//!
//! Every fallible operation in the library returns [`CalcError`]. The three
//! variants map onto how a caller is expected to react:
//! - [`CalcError::Validation`] - bad input, report and continue
//! - [`CalcError::Operation`] - a computation or persistence step failed, report and continue
//! - [`CalcError::Configuration`] - invalid static settings, abort startup

use thiserror::Error;

/// Primary error type for calculator operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// User input or operands were rejected before any computation ran.
    #[error("{0}")]
    Validation(String),

    /// A computation, reconstruction or persistence step failed.
    #[error("{0}")]
    Operation(String),

    /// Static configuration is invalid.
    #[error("{0}")]
    Configuration(String),
}

impl CalcError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The message without the variant tag.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::Operation(m) | Self::Configuration(m) => m,
        }
    }

    /// Re-tag any error as an operation failure, keeping the message.
    ///
    /// Used where a nested failure (for example a rejected operand while
    /// rebuilding a stored record) must surface as `OperationError`.
    pub fn into_operation(self, context: &str) -> Self {
        Self::Operation(format!("{context}: {}", self.message()))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CalcError>;
