use nodal_core::FlowsError;
use thiserror::Error;

/// Errors raised while reading or writing tab-separated tables.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TextFlowsError {
    /// The file has no header line.
    #[error("table is empty; expected a header line")]
    MissingHeader,
    /// A required column is absent from the header.
    #[error("column `{column}` not found in header")]
    ColumnNotFound {
        /// Name of the missing column.
        column: String,
    },
    /// A data line has fewer fields than the header requires.
    #[error("line {line} has {found} fields but column `{column}` is field {expected}")]
    MissingField {
        /// One-based line number.
        line: usize,
        /// Column that could not be read.
        column: String,
        /// One-based position of the column.
        expected: usize,
        /// Number of fields on the line.
        found: usize,
    },
    /// A flow cell is not a number.
    #[error("line {line}: `{value}` is not a valid flow")]
    InvalidFlow {
        /// One-based line number.
        line: usize,
        /// The offending cell.
        value: String,
    },
    /// A node code is not part of the flow table.
    #[error("line {line}: column `{column}` references unknown node code `{code}`")]
    UnknownCode {
        /// One-based line number.
        line: usize,
        /// Column holding the code.
        column: String,
        /// The unknown code.
        code: String,
    },
    /// A value cannot be written without breaking the table layout.
    #[error("value `{value}` contains a tab or line break")]
    UnwritableValue {
        /// The offending value.
        value: String,
    },
    /// The node sizes do not match the flow table.
    #[error("expected {expected} node sizes, got {actual}")]
    SizesMismatch {
        /// Number of nodes in the flow table.
        expected: usize,
        /// Number of sizes supplied.
        actual: usize,
    },
    /// Building or transforming flows failed.
    #[error(transparent)]
    Flows(#[from] FlowsError),
    /// Reading or writing the underlying file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
