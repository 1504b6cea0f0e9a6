//! Command-line interface of the `nodal` binary.
//!
//! `detect` builds the center hierarchy of a flow table and reports how well
//! each level scores; `center-flows` exports the flows between the centers of
//! one level.

mod commands;
mod errors;
mod source;
mod summary;

pub use commands::{
    CenterFlowsCommand, Cli, Command, DetectCommand, DetectorArgs, DistanceArg, PolicyArg, run_cli,
};
pub use errors::CliError;
pub use source::{FlowSource, ParquetArgs, TextArgs};
pub use summary::{
    BestLevels, CenterFlowsSummary, DetectSummary, ExecutionSummary, LevelSummary,
    SavedAssignments, render_summary,
};
