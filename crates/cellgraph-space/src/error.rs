//! Error types for index construction.

use thiserror::Error;

/// Errors arising from index construction.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// Bucket edge length must be finite and strictly positive.
    #[error("cell size must be finite and positive, got {value}")]
    InvalidCellSize {
        /// The rejected value.
        value: f64,
    },
    /// A position had a NaN or infinite coordinate.
    #[error("position of cell {index} is not finite")]
    NonFinitePosition {
        /// Index of the offending cell.
        index: usize,
    },
    /// More cells than a `CellIndex` can address.
    #[error("{count} cells exceed the index capacity")]
    TooManyCells {
        /// Number of cells offered.
        count: usize,
    },
}
