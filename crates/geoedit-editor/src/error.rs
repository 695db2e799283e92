//! Error types for the editing engine.
//!
//! Store and history failures are kept apart from the core taxonomy so the
//! undo stack can report "the effect failed" without pretending to be a
//! geometry error.

use geoedit_core::{ConversionError, FeatureId, TopologyError, ValidationError};
use thiserror::Error;

/// Feature store failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No feature with this id is stored
    #[error("Feature not found: {0}")]
    NotFound(FeatureId),

    /// A feature with this id is already stored
    #[error("Feature already exists: {0}")]
    AlreadyExists(FeatureId),

    /// Features without an identifier cannot be stored
    #[error("Feature has no identifier")]
    MissingId,

    /// The backing store failed
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Undo/redo failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// An undo or redo is still in flight
    #[error("Another undo/redo is in progress")]
    Busy,

    /// The action's effect on the store failed; the action stays on its stack
    #[error("Undo/redo effect failed: {0}")]
    Effect(#[from] StoreError),
}

/// Umbrella error for editor operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Geometry, validation, remote or topology error
    #[error(transparent)]
    Core(#[from] geoedit_core::Error),

    /// Undo/redo error
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Feature store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EditorError {
    /// Operator-facing message.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Core(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<ValidationError> for EditorError {
    fn from(err: ValidationError) -> Self {
        EditorError::Core(err.into())
    }
}

impl From<ConversionError> for EditorError {
    fn from(err: ConversionError) -> Self {
        EditorError::Core(err.into())
    }
}

impl From<TopologyError> for EditorError {
    fn from(err: TopologyError) -> Self {
        EditorError::Core(err.into())
    }
}

/// Result type for feature store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for undo/redo operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
