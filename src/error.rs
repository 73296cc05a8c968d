//! Unified error handling.
//!
//! Every fallible operation in the crate returns [`TrajectoryError`]. The
//! variants are grouped into a small taxonomy ([`ErrorKind`]) so that the
//! calling layer can map them onto user-facing codes without matching on
//! every variant.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrajectoryError>;

/// Broad classification of a [`TrajectoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing parameter. The caller can retry with corrected input.
    Validation,
    /// Bad data in the input or the store. Usually reported as a warning.
    DataQuality,
    /// Degenerate reference line or rectangle.
    Geometry,
    /// A query matched nothing.
    NotFound,
    /// The document store failed.
    Storage,
}

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("identifier '{identifier}' resolved to zero points")]
    EmptyGroup { identifier: String },

    #[error(
        "identifier '{identifier}' reports category {conflicting} but was first seen with {first}"
    )]
    InconsistentCategory {
        identifier: String,
        first: i64,
        conflicting: i64,
    },

    #[error("identifier '{identifier}' has more than one point at {timestamp}")]
    DuplicateTimestamp {
        identifier: String,
        timestamp: NaiveDateTime,
    },

    #[error("{name} hour {value} is outside {allowed}")]
    InvalidHour {
        name: &'static str,
        value: f64,
        allowed: &'static str,
    },

    #[error("time window {from} .. {to} is empty or reversed")]
    InvalidRange {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    #[error("document '{document_id}' has malformed geometry: {reason}")]
    MalformedGeometry { document_id: String, reason: String },

    #[error("invalid {what}: {reason}")]
    InvalidGeometry { what: &'static str, reason: String },

    #[error("invalid parameter '{parameter}': {reason}")]
    Validation { parameter: String, reason: String },

    #[error("line {line}: {reason}")]
    Decode { line: usize, reason: String },

    #[error("no trajectories found")]
    NotFound,

    #[error("document store error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "persistence")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl TrajectoryError {
    /// Shorthand for a [`TrajectoryError::Validation`] error.
    pub fn validation(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`TrajectoryError::InvalidGeometry`] error.
    pub fn invalid_geometry(what: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            what,
            reason: reason.into(),
        }
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHour { .. }
            | Self::InvalidRange { .. }
            | Self::Validation { .. }
            | Self::Decode { .. } => ErrorKind::Validation,
            Self::EmptyGroup { .. }
            | Self::InconsistentCategory { .. }
            | Self::DuplicateTimestamp { .. }
            | Self::MalformedGeometry { .. } => ErrorKind::DataQuality,
            Self::InvalidGeometry { .. } => ErrorKind::Geometry,
            Self::NotFound => ErrorKind::NotFound,
            Self::Storage(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Storage,
            #[cfg(feature = "persistence")]
            Self::Sqlite(_) => ErrorKind::Storage,
        }
    }
}

/// Extension for turning missing optional parameters into validation errors.
pub trait OptionExt<T> {
    fn ok_or_validation(self, parameter: &str, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_validation(self, parameter: &str, reason: &str) -> Result<T> {
        self.ok_or_else(|| TrajectoryError::validation(parameter, reason))
    }
}
