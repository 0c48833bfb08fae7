//! # AppError
//!
//! Centralized error handling for Houseboard.
//! Every failure a request can hit maps to exactly one of these variants.

use thiserror::Error;

/// The primary error type for all hb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required field is missing, blank or too long
    #[error("validation error: {0}")]
    Validation(String),

    /// A House with this name already exists
    #[error("a house named {0:?} already exists")]
    DuplicateName(String),

    /// Referenced entity is absent (e.g., House, Thread, Post)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, i64),

    /// Infrastructure failure (e.g., DB down, aborted transaction)
    #[error("store error: {0}")]
    Store(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        AppError::Store(err.to_string())
    }
}

/// A specialized Result type for Houseboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
