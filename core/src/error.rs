//! Error taxonomy shared by the mapper and every store implementation.
//!
//! # Design
//! Client mistakes (`MalformedInput`, `Validation`) and missing records
//! (`NotFound`) are kept apart from `Storage`, which covers everything the
//! database reports. Storage errors carry the driver's message as text so this
//! crate stays independent of any particular driver.

use thiserror::Error;

/// Errors produced while decoding requests or talking to the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// The request body or path could not be parsed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The request parsed but a required field is missing or empty.
    #[error("{0}")]
    Validation(String),

    /// No record exists with the given identifier.
    #[error("todo {0} not found")]
    NotFound(String),

    /// The database rejected the operation or could not be reached.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl TodoError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        TodoError::Storage(err.to_string())
    }

    /// True for errors caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TodoError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
