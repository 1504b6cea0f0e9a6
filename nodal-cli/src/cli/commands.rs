//! Argument parsing and command execution for the `nodal` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nodal_core::{
    Assignment, CenterDetector, CenterDetectorBuilder, DEFAULT_INDIRECT_FLOW_THRESHOLD,
    DEFAULT_SIMILARITY_THRESHOLD, DegreePolicy, DistanceType, FlowTable, FlowsProvider,
    best_scoring_level, get_local_flows_matrix, score_assignment,
};
use nodal_providers_text::{
    AssignmentTableOptions, DEFAULT_MIN_CENTER_SIZE, DEFAULT_MIN_EXPORTED_FLOW,
    load_assignment_table, save_assignment_table, save_center_flows,
};
use tracing::{Span, field, info, instrument};

use super::{
    errors::CliError,
    source::{FlowSource, load_flows},
    summary::{BestLevels, CenterFlowsSummary, DetectSummary, ExecutionSummary, LevelSummary, SavedAssignments},
};

const DEFAULT_MAX_LEVEL: i64 = 4;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "nodal", about = "Detect nested centers in a weighted flow graph.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Compute the center hierarchy, score every level and optionally save it.
    Detect(DetectCommand),
    /// Export the aggregated flows between the centers of one level.
    CenterFlows(CenterFlowsCommand),
}

/// Degree policy names accepted on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PolicyArg {
    /// Consecutive levels use the direct center flows.
    #[default]
    LevelSpan,
    /// Propagation deepens with the target level.
    TargetLevel,
}

impl From<PolicyArg> for DegreePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LevelSpan => Self::LevelSpan,
            PolicyArg::TargetLevel => Self::TargetLevel,
        }
    }
}

/// Distance normalisers accepted on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DistanceArg {
    /// Flow over the geometric mean of both sizes.
    #[default]
    GeometricMean,
    /// Flow over the arithmetic mean of both sizes.
    ArithmeticMean,
}

impl From<DistanceArg> for DistanceType {
    fn from(arg: DistanceArg) -> Self {
        match arg {
            DistanceArg::GeometricMean => Self::GeometricMean,
            DistanceArg::ArithmeticMean => Self::ArithmeticMean,
        }
    }
}

/// Detector tuning shared by every command.
#[derive(Debug, Args, Clone)]
pub struct DetectorArgs {
    /// How the indirect-flow degree follows the levels.
    #[arg(long, value_enum, default_value_t = PolicyArg::LevelSpan)]
    pub degree_policy: PolicyArg,

    /// Normaliser used for distance-decayed flows.
    #[arg(long, value_enum, default_value_t = DistanceArg::GeometricMean)]
    pub distance_type: DistanceArg,

    /// Propagated flows below this value are discarded.
    #[arg(long, default_value_t = DEFAULT_INDIRECT_FLOW_THRESHOLD)]
    pub indirect_flow_threshold: f64,

    /// Similarities below this value are discarded.
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    pub similarity_threshold: f64,

    /// Assignment table whose levels seed the detector instead of recomputing
    /// them.
    #[arg(long)]
    pub assignments: Option<PathBuf>,
}

impl Default for DetectorArgs {
    fn default() -> Self {
        Self {
            degree_policy: PolicyArg::default(),
            distance_type: DistanceArg::default(),
            indirect_flow_threshold: DEFAULT_INDIRECT_FLOW_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            assignments: None,
        }
    }
}

/// Options accepted by the `detect` command.
#[derive(Debug, Args, Clone)]
pub struct DetectCommand {
    /// Highest level to compute.
    #[arg(long, default_value_t = DEFAULT_MAX_LEVEL, allow_negative_numbers = true)]
    pub max_level: i64,

    /// Centers that never reach this size are left out of the saved table.
    #[arg(long, default_value_t = DEFAULT_MIN_CENTER_SIZE)]
    pub min_center_size: f64,

    /// Save codes only.
    #[arg(long)]
    pub no_names: bool,

    /// Where to save the assignment table.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Detector tuning.
    #[command(flatten)]
    pub detector: DetectorArgs,

    /// Flow source.
    #[command(subcommand)]
    pub source: FlowSource,
}

/// Options accepted by the `center-flows` command.
#[derive(Debug, Args, Clone)]
pub struct CenterFlowsCommand {
    /// Level whose centers are exported.
    #[arg(long, allow_negative_numbers = true)]
    pub level: i64,

    /// Number of squarings applied to the center flows.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub degree: i64,

    /// Center flows below this value are not exported.
    #[arg(long, default_value_t = DEFAULT_MIN_EXPORTED_FLOW)]
    pub min_flow: f64,

    /// Aggregate distance-decayed local flows instead of the raw flows.
    #[arg(long)]
    pub local: bool,

    /// Where to write the table.
    #[arg(long)]
    pub output: PathBuf,

    /// Detector tuning.
    #[command(flatten)]
    pub detector: DetectorArgs,

    /// Flow source.
    #[command(subcommand)]
    pub source: FlowSource,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, detection or saving fails.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Detect(command) => {
            span.record("command", field::display("detect"));
            run_detect(&command).map(ExecutionSummary::Detect)
        }
        Command::CenterFlows(command) => {
            span.record("command", field::display("center-flows"));
            run_center_flows(&command).map(ExecutionSummary::CenterFlows)
        }
    }
}

fn build_detector(table: &FlowTable, args: &DetectorArgs) -> Result<CenterDetector, CliError> {
    let builder = CenterDetectorBuilder::new()
        .with_degree_policy(args.degree_policy.into())
        .with_distance_type(args.distance_type.into())
        .with_indirect_flow_threshold(args.indirect_flow_threshold)
        .with_similarity_threshold(args.similarity_threshold);
    let detector = match &args.assignments {
        Some(path) => {
            let levels = load_assignment_table(table, path)?;
            info!(levels = levels.len(), path = %path.display(), "seeding detector");
            builder.build_with_levels(table.flows(), levels)?
        }
        None => builder.build(table.flows())?,
    };
    Ok(detector)
}

#[instrument(
    name = "cli.detect",
    err,
    skip(command),
    fields(max_level = command.max_level, source = field::Empty),
)]
pub(super) fn run_detect(command: &DetectCommand) -> Result<DetectSummary, CliError> {
    let table = load_flows(&command.source)?;
    Span::current().record("source", table.name());
    let mut detector = build_detector(&table, &command.detector)?;
    let levels: Vec<Assignment> = detector.get_leveled_assignments(0, command.max_level)?.to_vec();

    let mut level_summaries = Vec::with_capacity(levels.len());
    for (level, assignment) in levels.iter().enumerate() {
        let score = score_assignment(table.flows(), assignment)?;
        info!(level, centers = assignment.center_count(), %score, "scored level");
        level_summaries.push(LevelSummary {
            level,
            centers: assignment.center_count(),
            score,
        });
    }
    let best = best_levels(&detector, &table, command.detector.distance_type.into())?;

    let saved = match &command.output {
        Some(path) => {
            let options = AssignmentTableOptions {
                min_center_size: command.min_center_size,
                save_node_names: !command.no_names,
            };
            let table_summary = save_assignment_table(&table, &levels, detector.node_sizes(), options, path)?;
            Some(SavedAssignments {
                path: path.clone(),
                summary: table_summary,
            })
        }
        None => None,
    };

    Ok(DetectSummary {
        data_source: table.name().to_owned(),
        nodes: table.node_count(),
        levels: level_summaries,
        best,
        saved,
    })
}

/// Best levels for the raw flows, the local flows and the indirect flows
/// between the centers of the best local level.
fn best_levels(
    detector: &CenterDetector,
    table: &FlowTable,
    distance_type: DistanceType,
) -> Result<BestLevels, CliError> {
    let direct = best_scoring_level(detector, table.flows(), 0)?;
    let local_flows = get_local_flows_matrix(table.flows(), detector.node_sizes(), distance_type)?;
    let local = best_scoring_level(detector, &local_flows, 0)?;
    let indirect = match local.and_then(|best| detector.assignment(best.level).map(|a| (best.level, a))) {
        Some((level, assignment)) => {
            let center_flows = CenterDetector::get_center_flows_of_degree(table.flows(), assignment, 1)?;
            best_scoring_level(detector, &center_flows, level)?
        }
        None => None,
    };
    Ok(BestLevels {
        direct,
        local,
        indirect,
    })
}

#[instrument(
    name = "cli.center_flows",
    err,
    skip(command),
    fields(level = command.level, degree = command.degree, local = command.local),
)]
pub(super) fn run_center_flows(command: &CenterFlowsCommand) -> Result<CenterFlowsSummary, CliError> {
    let table = load_flows(&command.source)?;
    let mut detector = build_detector(&table, &command.detector)?;
    let assignment = detector.get_assignment_of_level(command.level)?.clone();
    let written = if command.local {
        let local_flows = get_local_flows_matrix(
            table.flows(),
            detector.node_sizes(),
            command.detector.distance_type.into(),
        )?;
        save_center_flows(&table, &local_flows, &assignment, command.degree, command.min_flow, &command.output)?
    } else {
        save_center_flows(&table, table.flows(), &assignment, command.degree, command.min_flow, &command.output)?
    };
    info!(written, output = %command.output.display(), "center flows saved");
    Ok(CenterFlowsSummary {
        data_source: table.name().to_owned(),
        level: command.level,
        degree: command.degree,
        centers: assignment.center_count(),
        written,
        output: command.output.clone(),
    })
}
