//! Error types for cell ingestion.
//!
//! Split by severity: a [`RecordError`] rejects one input record and is
//! always recoverable (the record is skipped and counted), while a
//! [`RegistryError`] stops registry construction.

use thiserror::Error;

/// Why a single input record was rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RecordError {
    /// The id was missing, empty or all whitespace.
    #[error("record has no id")]
    MissingId,
    /// A coordinate was NaN or infinite.
    #[error("record '{id}' has non-finite {axis} coordinate ({value})")]
    NonFiniteCoordinate {
        /// Id of the offending record.
        id: String,
        /// Axis name: `x`, `y` or `z`.
        axis: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The source could not decode the record at all.
    #[error("malformed record at line {line}: {reason}")]
    Malformed {
        /// 1-based line (or record) number in the source.
        line: u64,
        /// What was wrong with it.
        reason: String,
    },
}

/// Fatal errors while building a registry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A duplicate id was seen under [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject).
    #[error("duplicate cell id '{id}'")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },
    /// More distinct cells than a [`CellIndex`](crate::CellIndex) can address.
    #[error("cell count exceeds {max}")]
    TooManyCells {
        /// The addressable maximum.
        max: u64,
    },
}
