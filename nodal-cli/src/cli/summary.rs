//! Outcomes of CLI commands and their text rendering.
use std::{
    io::{self, Write},
    path::PathBuf,
};

use nodal_core::{AssignmentScore, BestLevel};
use nodal_providers_text::AssignmentTableSummary;

/// Outcome of any CLI command.
#[derive(Debug, Clone)]
pub enum ExecutionSummary {
    /// Result of `detect`.
    Detect(DetectSummary),
    /// Result of `center-flows`.
    CenterFlows(CenterFlowsSummary),
}

/// Center count and score of one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSummary {
    /// Level index.
    pub level: usize,
    /// Number of distinct centers.
    pub centers: usize,
    /// Score against the raw flows.
    pub score: AssignmentScore,
}

/// Best scoring levels for several views of the flows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BestLevels {
    /// Raw flows from level 0.
    pub direct: Option<BestLevel>,
    /// Distance-decayed local flows from level 0.
    pub local: Option<BestLevel>,
    /// Degree-one center flows from the best local level.
    pub indirect: Option<BestLevel>,
}

/// Where the assignment table went and what it kept.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAssignments {
    /// Output path.
    pub path: PathBuf,
    /// Centers written per level.
    pub summary: AssignmentTableSummary,
}

/// Result of the `detect` command.
#[derive(Debug, Clone)]
pub struct DetectSummary {
    /// Name of the flow source.
    pub data_source: String,
    /// Number of nodes.
    pub nodes: usize,
    /// Levels `0..=max_level` in order.
    pub levels: Vec<LevelSummary>,
    /// Best levels found by the score walk.
    pub best: BestLevels,
    /// Saved table, when an output was requested.
    pub saved: Option<SavedAssignments>,
}

/// Result of the `center-flows` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterFlowsSummary {
    /// Name of the flow source.
    pub data_source: String,
    /// Exported level.
    pub level: i64,
    /// Propagation degree.
    pub degree: i64,
    /// Number of centers at that level.
    pub centers: usize,
    /// Number of written center pairs.
    pub written: usize,
    /// Output path.
    pub output: PathBuf,
}

fn render_best(writer: &mut impl Write, label: &str, best: Option<BestLevel>) -> io::Result<()> {
    match best {
        Some(best) => writeln!(writer, "best level for {label}: {} ({})", best.level, best.score),
        None => writeln!(writer, "best level for {label}: none"),
    }
}

/// Renders `summary` to `writer` as human-readable text.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
///
/// use nodal_cli::cli::{CenterFlowsSummary, ExecutionSummary, render_summary};
///
/// let summary = ExecutionSummary::CenterFlows(CenterFlowsSummary {
///     data_source: "demo".into(),
///     level: 1,
///     degree: 0,
///     centers: 2,
///     written: 4,
///     output: PathBuf::from("centers.tsv"),
/// });
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.contains("center pairs written: 4"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Detect(detect) => {
            writeln!(writer, "data source: {}", detect.data_source)?;
            writeln!(writer, "nodes: {}", detect.nodes)?;
            writeln!(writer, "level\tcenters\tscore")?;
            for level in &detect.levels {
                writeln!(writer, "{}\t{}\t{}", level.level, level.centers, level.score)?;
            }
            render_best(&mut writer, "direct flows", detect.best.direct)?;
            render_best(&mut writer, "local flows", detect.best.local)?;
            render_best(&mut writer, "indirect flows", detect.best.indirect)?;
            if let Some(saved) = &detect.saved {
                writeln!(writer, "assignments saved to: {}", saved.path.display())?;
                writeln!(writer, "discarded centers: {}", saved.summary.discarded_centers)?;
            }
        }
        ExecutionSummary::CenterFlows(flows) => {
            writeln!(writer, "data source: {}", flows.data_source)?;
            writeln!(writer, "level: {} (degree {})", flows.level, flows.degree)?;
            writeln!(writer, "centers: {}", flows.centers)?;
            writeln!(writer, "center pairs written: {}", flows.written)?;
            writeln!(writer, "output: {}", flows.output.display())?;
        }
    }
    Ok(())
}
