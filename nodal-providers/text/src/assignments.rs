//! Persistence of leveled assignments as node by level code tables.
//!
//! Row `i` describes node `i`: its code and name, then the code and name of
//! its center at every level from 1 upwards. Centers that never grow past the
//! configured size are written as empty cells and read back as
//! self-assignments.

use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use nodal_core::{Assignment, FlowsError, FlowsProvider};
use tracing::{info, instrument};

use crate::{errors::TextFlowsError, tsv};

/// Centers smaller than this at every level are not written.
pub const DEFAULT_MIN_CENTER_SIZE: f64 = 1000.0;

/// Column holding the code of the node described by a row.
pub const NODE_CODE_COLUMN: &str = "node_code";
/// Column holding the name of the node described by a row.
pub const NODE_NAME_COLUMN: &str = "node_name";

/// Options controlling how assignments are written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssignmentTableOptions {
    /// Centers whose largest size over all levels is below this value are
    /// written as empty cells.
    pub min_center_size: f64,
    /// Whether a name column follows every code column.
    pub save_node_names: bool,
}

impl Default for AssignmentTableOptions {
    fn default() -> Self {
        Self {
            min_center_size: DEFAULT_MIN_CENTER_SIZE,
            save_node_names: true,
        }
    }
}

/// What [`write_assignment_table`] kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentTableSummary {
    /// Number of written centers at levels `1..`, in level order.
    pub centers_per_level: Vec<usize>,
    /// Number of nodes that never reach the minimum center size.
    pub discarded_centers: usize,
}

fn level_columns(level: usize) -> (String, String) {
    if level == 0 {
        (NODE_CODE_COLUMN.to_owned(), NODE_NAME_COLUMN.to_owned())
    } else {
        (format!("center_{level}_code"), format!("center_{level}_name"))
    }
}

fn parse_level_column(column: &str) -> Option<usize> {
    column
        .strip_prefix("center_")?
        .strip_suffix("_code")?
        .parse()
        .ok()
        .filter(|&level| level > 0)
}

/// Largest size every node reaches as a center across `levels`.
fn max_center_sizes(levels: &[Assignment], node_sizes: &[f64]) -> Result<Vec<f64>, FlowsError> {
    let mut largest = vec![0.0_f64; node_sizes.len()];
    for level in levels {
        for (slot, size) in largest.iter_mut().zip(level.group_sums(node_sizes)?) {
            *slot = slot.max(size);
        }
    }
    Ok(largest)
}

/// Writes `levels` as a tab-separated table.
///
/// Level 0 is written as the `node_code` column whatever its content, so
/// `levels` should start with the identity as every detector hierarchy does.
///
/// # Errors
/// Returns [`TextFlowsError::SizesMismatch`] when `node_sizes` does not match
/// the provider, [`TextFlowsError::Flows`] when a level does not cover every
/// node and [`TextFlowsError::Io`] or [`TextFlowsError::UnwritableValue`]
/// when writing fails.
#[instrument(
    name = "text.write_assignments",
    err,
    skip(provider, levels, node_sizes, writer),
    fields(source = provider.name(), levels = levels.len()),
)]
pub fn write_assignment_table<P, W>(
    provider: &P,
    levels: &[Assignment],
    node_sizes: &[f64],
    options: AssignmentTableOptions,
    mut writer: W,
) -> Result<AssignmentTableSummary, TextFlowsError>
where
    P: FlowsProvider + ?Sized,
    W: Write,
{
    let nodes = provider.node_count();
    if node_sizes.len() != nodes {
        return Err(TextFlowsError::SizesMismatch {
            expected: nodes,
            actual: node_sizes.len(),
        });
    }
    if let Some(level) = levels.iter().find(|level| level.len() != nodes) {
        return Err(FlowsError::AssignmentLengthMismatch {
            nodes,
            assignment: level.len(),
        }
        .into());
    }
    let represented: Vec<bool> = max_center_sizes(levels, node_sizes)?
        .into_iter()
        .map(|size| size >= options.min_center_size)
        .collect();
    let is_represented = |center: usize| represented.get(center).copied().unwrap_or(false);

    let level_count = levels.len().max(1);
    let mut header = Vec::with_capacity(level_count * 2);
    for level in 0..level_count {
        let (code, name) = level_columns(level);
        header.push(code);
        if options.save_node_names {
            header.push(name);
        }
    }
    tsv::write_record(&mut writer, &header)?;

    let code_of = |node: usize| provider.node_code(node).unwrap_or_default();
    let name_of = |node: usize| provider.node_name(node).unwrap_or_default();
    let mut row = Vec::with_capacity(header.len());
    for node in 0..nodes {
        row.clear();
        row.push(code_of(node));
        if options.save_node_names {
            row.push(name_of(node));
        }
        for level in levels.iter().skip(1) {
            let center = level.center_of(node).filter(|&center| is_represented(center));
            row.push(center.map_or("", code_of));
            if options.save_node_names {
                row.push(center.map_or("", name_of));
            }
        }
        tsv::write_record(&mut writer, &row)?;
    }
    writer.flush()?;

    let centers_per_level: Vec<usize> = levels
        .iter()
        .skip(1)
        .map(|level| {
            level
                .iter()
                .filter(|&center| is_represented(center))
                .collect::<BTreeSet<_>>()
                .len()
        })
        .collect();
    for (level, centers) in centers_per_level.iter().enumerate() {
        info!(level = level + 1, centers, "saved centers");
    }
    let discarded_centers = represented.iter().filter(|&&kept| !kept).count();
    info!(discarded = discarded_centers, "small centers discarded");
    Ok(AssignmentTableSummary {
        centers_per_level,
        discarded_centers,
    })
}

/// Writes `levels` to the file at `path`, replacing it.
///
/// # Errors
/// See [`write_assignment_table`].
pub fn save_assignment_table<P: FlowsProvider + ?Sized>(
    provider: &P,
    levels: &[Assignment],
    node_sizes: &[f64],
    options: AssignmentTableOptions,
    path: impl AsRef<Path>,
) -> Result<AssignmentTableSummary, TextFlowsError> {
    let file = File::create(path)?;
    write_assignment_table(provider, levels, node_sizes, options, BufWriter::new(file))
}

/// Reads a table written by [`write_assignment_table`] back into levels.
///
/// Rows are matched to nodes through `node_code`, so their order does not
/// matter. Level 0 is the identity. Empty center cells and nodes without a
/// row keep themselves as center.
///
/// # Errors
/// Returns [`TextFlowsError::MissingHeader`] for empty input,
/// [`TextFlowsError::ColumnNotFound`] without a `node_code` column and
/// [`TextFlowsError::UnknownCode`] when a code is not part of the provider.
#[instrument(name = "text.read_assignments", err, skip_all, fields(source = provider.name()))]
pub fn read_assignment_table<P, R>(provider: &P, reader: R) -> Result<Vec<Assignment>, TextFlowsError>
where
    P: FlowsProvider + ?Sized,
    R: BufRead,
{
    let (header, rows) = tsv::read_table(reader)?;
    let node_column = header.require(NODE_CODE_COLUMN)?;
    let mut center_columns: Vec<(usize, usize)> = header
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(position, column)| parse_level_column(column).map(|level| (level, position)))
        .collect();
    center_columns.sort_unstable();

    let nodes = provider.node_count();
    let mut levels: Vec<Vec<usize>> = vec![(0..nodes).collect(); center_columns.len() + 1];
    let lookup = |line: usize, position: usize, code: &str| {
        provider
            .node_index(code)
            .ok_or_else(|| TextFlowsError::UnknownCode {
                line,
                column: header.columns().get(position).cloned().unwrap_or_default(),
                code: code.to_owned(),
            })
    };
    for (line, text) in &rows {
        let fields: Vec<&str> = tsv::split(text).collect();
        let node_code = tsv::field(&fields, node_column, *line, &header)?;
        let node = lookup(*line, node_column, node_code)?;
        for (slot, &(_, position)) in levels.iter_mut().skip(1).zip(&center_columns) {
            let code = fields.get(position).copied().unwrap_or_default();
            if code.is_empty() {
                continue;
            }
            let center = lookup(*line, position, code)?;
            if let Some(entry) = slot.get_mut(node) {
                *entry = center;
            }
        }
    }
    info!(levels = levels.len(), rows = rows.len(), "restored assignment levels");
    Ok(levels
        .into_iter()
        .map(Assignment::new)
        .collect::<Result<Vec<_>, FlowsError>>()?)
}

/// Reads the assignment table at `path`.
///
/// # Errors
/// See [`read_assignment_table`].
pub fn load_assignment_table<P: FlowsProvider + ?Sized>(
    provider: &P,
    path: impl AsRef<Path>,
) -> Result<Vec<Assignment>, TextFlowsError> {
    let file = File::open(path)?;
    read_assignment_table(provider, BufReader::new(file))
}
