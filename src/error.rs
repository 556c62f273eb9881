//! Error types for locale registration and translation persistence.
//!
//! Read paths never fail for an unknown locale code (they fall back to the
//! default locale). Errors surface only for explicit configuration mistakes,
//! invalid input, and storage failures.

use std::fmt;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error.
#[derive(Debug, Error)]
pub enum Error {
    /// Setting (or resolving) a default locale that is not registered.
    #[error("Locale '{0}' is not supported")]
    LocaleNotSupported(String),

    /// Input rejected by locale validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Failure reported by the storage collaborator.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Seed definitions could not be read or parsed.
    #[error("Failed to load seed definitions: {0}")]
    Seed(String),
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A uniqueness constraint would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded into its domain type.
    #[error("Failed to decode stored value: {0}")]
    Decode(String),

    /// The row to update no longer exists.
    #[error("Row {0} not found")]
    NotFound(i64),
}

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collection of field violations, similar to a form validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of the violated fields, in the order they were reported.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    /// Check whether a given field was reported.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn a non-empty report into an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
