//! Tab-separated flow tables for nodal.
//!
//! Reads incoming flow records into a [`nodal_core::FlowsProvider`], and
//! persists leveled assignments and aggregated center flows as
//! tab-separated tables keyed by node code.

mod assignments;
mod center_flows;
mod errors;
mod source;
mod tsv;

pub use assignments::{
    AssignmentTableOptions, AssignmentTableSummary, DEFAULT_MIN_CENTER_SIZE, NODE_CODE_COLUMN,
    NODE_NAME_COLUMN, load_assignment_table, read_assignment_table, save_assignment_table,
    write_assignment_table,
};
pub use center_flows::{DEFAULT_MIN_EXPORTED_FLOW, save_center_flows, write_center_flows};
pub use errors::TextFlowsError;
pub use source::{
    FLOW_COLUMN, SOURCE_CODE_COLUMN, SOURCE_NAME_COLUMN, TARGET_CODE_COLUMN, TARGET_NAME_COLUMN,
    TextFlowsSource,
};

#[cfg(test)]
mod tests;
