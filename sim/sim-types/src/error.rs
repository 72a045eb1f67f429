//! Error types for coupling and block-matrix operations.

use thiserror::Error;

/// Errors that can occur in the coupling engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Constraint-info storage does not match the coupling's row count.
    #[error("constraint storage has {actual} rows, expected {expected}")]
    ConstraintStorage {
        /// Rows the coupling needs.
        expected: usize,
        /// Rows supplied by the caller.
        actual: usize,
    },

    /// Coordinate index out of range for the coupling.
    #[error("coordinate index {index} out of range (coupling has {count})")]
    InvalidCoordinate {
        /// Requested index.
        index: usize,
        /// Number of coordinates.
        count: usize,
    },

    /// Coordinate buffer length does not match the coupling.
    #[error("coordinate buffer has {actual} entries, expected {expected}")]
    CoordinateCount {
        /// Coordinates the coupling has.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Joint has no relative pose yet.
    #[error("joint is not attached: no relative transform has been set")]
    NotAttached,

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Block row or column index out of range.
    #[error("block index ({row}, {col}) out of range for {rows}x{cols} block matrix")]
    InvalidBlockIndex {
        /// Block row.
        row: usize,
        /// Block column.
        col: usize,
        /// Number of block rows.
        rows: usize,
        /// Number of block columns.
        cols: usize,
    },

    /// Block dimensions do not match the row/column sizes.
    #[error("block at ({row}, {col}) is {actual_rows}x{actual_cols}, expected {expected_rows}x{expected_cols}")]
    BlockSizeMismatch {
        /// Block row.
        row: usize,
        /// Block column.
        col: usize,
        /// Expected number of rows.
        expected_rows: usize,
        /// Expected number of columns.
        expected_cols: usize,
        /// Actual number of rows.
        actual_rows: usize,
        /// Actual number of columns.
        actual_cols: usize,
    },

    /// Vector length does not match the matrix dimension it multiplies.
    #[error("vector has {actual} entries, expected {expected}")]
    VectorLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A block carries a number already owned by another live block.
    #[error("block number {number} is already used by the block at ({row}, {col})")]
    BlockNumberInUse {
        /// Requested number.
        number: usize,
        /// Block row of the current owner.
        row: usize,
        /// Block column of the current owner.
        col: usize,
    },

    /// Block numbering bookkeeping is corrupt.
    #[error("inconsistent block numbering: {reason}")]
    InconsistentNumbering {
        /// Description of the inconsistency.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an inconsistent numbering error.
    #[must_use]
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentNumbering {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this is a numbering consistency fault.
    #[must_use]
    pub fn is_inconsistency(&self) -> bool {
        matches!(self, Self::InconsistentNumbering { .. })
    }
}
