//! Flow providers backed by Parquet and Arrow edge tables.
//!
//! The table lists incoming flows, one per row, with the same column layout
//! as the tab-separated format: codes and flows are required, names are
//! optional.

mod columns;
mod errors;
mod ingest;
mod source;

pub use columns::FlowColumns;
pub use errors::ParquetFlowsError;
pub use source::ParquetFlowsSource;

#[cfg(test)]
mod tests;
