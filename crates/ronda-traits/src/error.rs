//! Error types for the ronda pipeline.
//!
//! Errors fall into three groups: configuration errors raised before any
//! computation starts, data-sufficiency errors raised when cleaned input is
//! empty or unusable, and persistence errors carrying the storage layer's
//! own error as their source.

use thiserror::Error;

/// Boxed source error from a storage backend.
pub type StorageSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// A parameter failed validation.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A factor name does not resolve to any known factor.
    #[error("unknown factor: {0}")]
    UnknownFactor(String),

    /// A string option (weighting scheme, frequency, column, ...) was not recognised.
    #[error("unknown {kind}: {value}")]
    UnknownOption {
        /// What kind of option was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Input is empty or entirely undefined after cleaning.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Input violates a structural invariant (ordering, duplicates, ...).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A required column is missing from a frame or history source.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A factor name is already registered with different parameters or version.
    #[error(
        "factor `{name}` is already registered with {field} {existing}, refusing {requested}"
    )]
    DefinitionConflict {
        /// Factor name.
        name: String,
        /// Which field differs.
        field: &'static str,
        /// Stored value.
        existing: String,
        /// Value in the rejected registration.
        requested: String,
    },

    /// The storage backend failed; the transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(#[source] StorageSource),

    /// Error from Polars operations.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error (de)serialising factor parameters.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while exporting a frame.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RondaError {
    /// Shorthand for an [`RondaError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap any storage backend error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    /// Whether this error is a configuration error (raised before computing).
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::UnknownFactor(_) | Self::UnknownOption { .. }
        )
    }
}

/// A specialized Result type for ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;
