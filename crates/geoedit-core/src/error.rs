//! Error handling for GeoEdit
//!
//! Provides the error taxonomy shared by every layer of the editing engine:
//! - Conversion errors (non-finite or malformed coordinates)
//! - Validation errors (client-side preconditions, checked before any network call)
//! - Remote operation errors (service rejection or transport failure)
//! - Topology errors (cut line does not properly cross the target polygon)
//!
//! None of these are fatal: every path resolves to a user-visible message via
//! [`Error::user_message`] and leaves the editor in a resumable state.

use thiserror::Error;

/// Coordinate conversion error
///
/// Raised when a geometry cannot round-trip between the display and storage
/// projections. Geometries that fail conversion must never be persisted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A coordinate is NaN or infinite
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite {
        /// The x (easting / longitude) component.
        x: f64,
        /// The y (northing / latitude) component.
        y: f64,
    },

    /// The geometry violates a structural invariant
    #[error("Degenerate {kind}: {reason}")]
    Degenerate {
        /// The geometry kind name.
        kind: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The coordinate cannot be represented in the target projection
    #[error("Coordinate ({x}, {y}) is outside the {projection} range")]
    OutOfRange {
        /// The projection the coordinate was converted to or from.
        projection: String,
        /// The x (easting / longitude) component.
        x: f64,
        /// The y (northing / latitude) component.
        y: f64,
    },

    /// The geometry type cannot be edited
    #[error("Unsupported geometry type: {0}")]
    Unsupported(String),
}

/// Client-side validation error
///
/// Precondition failures detected before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The operation requires a different geometry type
    #[error("{operation} requires a {expected} geometry, got {actual}")]
    WrongGeometryType {
        /// The operation name.
        operation: String,
        /// The expected geometry kind.
        expected: String,
        /// The supplied geometry kind.
        actual: String,
    },

    /// Not enough inputs were supplied
    #[error("Select at least {required} features to {operation} (got {actual})")]
    TooFewInputs {
        /// The operation name.
        operation: String,
        /// Minimum number of inputs.
        required: usize,
        /// Number of inputs supplied.
        actual: usize,
    },

    /// Buffer distance must be strictly positive
    #[error("Buffer distance must be positive, got {0}")]
    NonPositiveDistance(f64),

    /// Simplification tolerance must be strictly positive
    #[error("Simplify tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),

    /// No polygon has been chosen for splitting
    #[error("No polygon selected for splitting")]
    MissingTarget,

    /// No cut line has been drawn yet
    #[error("Draw a cut line before confirming the split")]
    MissingCutLine,

    /// The operation needs a selection and there is none
    #[error("No features selected")]
    NothingSelected,

    /// The referenced feature does not exist
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
}

/// Remote geometry service error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteOperationError {
    /// The service answered with `success: false`
    #[error("{operation} failed: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// The operation name.
        operation: String,
        /// The service-provided message, if any.
        message: Option<String>,
    },

    /// The service reported success without returning a result
    #[error("{operation} returned no result")]
    EmptyResult {
        /// The operation name.
        operation: String,
    },

    /// A split produced fewer than two parts
    #[error("Split produced {actual} part(s), expected at least 2")]
    InsufficientParts {
        /// Number of parts returned.
        actual: usize,
    },

    /// The request never completed
    #[error("{operation} transport error: {reason}")]
    Transport {
        /// The operation name.
        operation: String,
        /// The underlying failure.
        reason: String,
    },
}

/// Split topology error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// Both endpoints of the cut line lie strictly inside the target polygon
    #[error("The cut line must cross the polygon boundary")]
    CutLineInsideTarget,

    /// The cut line does not touch the target polygon at all
    #[error("The cut line does not intersect the polygon")]
    CutLineMissesTarget,
}

/// Main error type for GeoEdit
///
/// A unified error type that can represent any failure of the editing engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Conversion error
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Remote operation error
    #[error(transparent)]
    Remote(#[from] RemoteOperationError),

    /// Topology error
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Another operation is still in flight
    #[error("{operation} rejected: another geometry operation is in progress")]
    Busy {
        /// The operation that was rejected.
        operation: String,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error was detected before contacting the service
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Topology(_) | Error::Conversion(_) | Error::Busy { .. }
        )
    }

    /// Check if this is a remote operation error
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// Operator-facing message for the feedback sink.
    ///
    /// Remote failures use the service-provided message when available and
    /// fall back to a generic per-operation message otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Error::Remote(RemoteOperationError::Rejected {
                message: Some(message),
                ..
            }) if !message.trim().is_empty() => message.clone(),
            Error::Remote(RemoteOperationError::Rejected { operation, .. })
            | Error::Remote(RemoteOperationError::EmptyResult { operation })
            | Error::Remote(RemoteOperationError::Transport { operation, .. }) => {
                format!("Failed to {} geometry", operation)
            }
            other => other.to_string(),
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
