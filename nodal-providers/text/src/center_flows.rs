//! Export of aggregated center flows for inspection.
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use nodal_core::{
    Assignment, CenterDetector, FlowMatrix, FlowsProvider, filter_small_values,
};
use tracing::{info, instrument};

use crate::{errors::TextFlowsError, tsv};

/// Center flows below this value are not exported.
pub const DEFAULT_MIN_EXPORTED_FLOW: f64 = 5.0;

const HEADER: [&str; 7] = [
    "node_1_code",
    "node_1_name",
    "node_2_code",
    "node_2_name",
    "flow",
    "node_1_size",
    "node_2_size",
];

/// Aggregates `flows` by `assignment`, propagates them to `degree` and writes
/// every center pair whose flow reaches `min_flow`.
///
/// `flows` is indexed like the provider, typically its own flows or their
/// distance-decayed version. Center sizes are the summed provider flows of
/// each center's members. Returns the number of written pairs.
///
/// # Errors
/// Returns [`TextFlowsError::Flows`] when `assignment` does not match `flows`
/// or `degree` is negative and [`TextFlowsError::Io`] when writing fails.
#[instrument(
    name = "text.write_center_flows",
    err,
    skip(provider, flows, assignment, writer),
    fields(source = provider.name(), centers = assignment.center_count()),
)]
pub fn write_center_flows<P, M, W>(
    provider: &P,
    flows: &M,
    assignment: &Assignment,
    degree: i64,
    min_flow: f64,
    mut writer: W,
) -> Result<usize, TextFlowsError>
where
    P: FlowsProvider + ?Sized,
    M: FlowMatrix,
    W: Write,
{
    let mut center_flows = CenterDetector::get_center_flows_of_degree(flows, assignment, degree)?;
    filter_small_values(&mut center_flows, min_flow);
    let centers = assignment.centers();
    let sizes = assignment.group_sums(&provider.flows().row_sums())?;

    let describe = |position: usize| {
        let node = centers.get(position).copied().unwrap_or(position);
        (
            provider.node_code(node).unwrap_or_default(),
            provider.node_name(node).unwrap_or_default(),
            sizes.get(node).copied().unwrap_or(0.0),
        )
    };

    tsv::write_record(&mut writer, HEADER)?;
    let mut written = 0_usize;
    let mut failure = None;
    center_flows.for_each_nonzero(|row, col, flow| {
        if failure.is_some() {
            return;
        }
        let (code_1, name_1, size_1) = describe(row);
        let (code_2, name_2, size_2) = describe(col);
        let record = [
            code_1.to_owned(),
            name_1.to_owned(),
            code_2.to_owned(),
            name_2.to_owned(),
            flow.to_string(),
            size_1.to_string(),
            size_2.to_string(),
        ];
        match tsv::write_record(&mut writer, &record) {
            Ok(()) => written += 1,
            Err(err) => failure = Some(err),
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }
    writer.flush()?;
    info!(written, "center flows exported");
    Ok(written)
}

/// Writes center flows to the file at `path`, replacing it.
///
/// # Errors
/// See [`write_center_flows`].
pub fn save_center_flows<P, M>(
    provider: &P,
    flows: &M,
    assignment: &Assignment,
    degree: i64,
    min_flow: f64,
    path: impl AsRef<Path>,
) -> Result<usize, TextFlowsError>
where
    P: FlowsProvider + ?Sized,
    M: FlowMatrix,
{
    let file = File::create(path)?;
    write_center_flows(provider, flows, assignment, degree, min_flow, BufWriter::new(file))
}
