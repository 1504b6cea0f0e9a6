use arrow_schema::{ArrowError, DataType};
use nodal_core::FlowsError;
use thiserror::Error;

/// Errors raised while loading flows from Arrow or Parquet data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParquetFlowsError {
    /// A configured column is absent from the schema.
    #[error("column `{column}` not found in Parquet schema")]
    ColumnNotFound {
        /// Name of the missing column.
        column: String,
    },
    /// A column does not have a supported type.
    #[error("column `{column}` must be {expected} but found {actual:?}")]
    InvalidColumnType {
        /// Name of the offending column.
        column: String,
        /// Description of the accepted types.
        expected: &'static str,
        /// Type found in the schema.
        actual: DataType,
    },
    /// A code or flow cell is null.
    #[error("row {row} of column `{column}` is null")]
    NullValue {
        /// Name of the offending column.
        column: String,
        /// Zero-based row across all batches.
        row: usize,
    },
    /// Building the flow table failed.
    #[error(transparent)]
    Flows(#[from] FlowsError),
    /// Arrow rejected the data.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// The Parquet file could not be decoded.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    /// Opening the file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
