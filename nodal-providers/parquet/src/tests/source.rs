use nodal_core::{FlowMatrix, FlowsError, FlowsProvider, UNKNOWN_NODE_NAME};
use nodal_test_support::fixtures::COMMUTER_FLOWS;
use rstest::rstest;

use super::support::{CODES, NAMES, commuter_batch, renamed_batch, write_parquet};
use crate::{FlowColumns, ParquetFlowsError, ParquetFlowsSource};

fn renamed_columns() -> FlowColumns {
    FlowColumns::default()
        .with_target_code("destination")
        .with_source_code("origin")
        .with_flow("trips")
}

#[rstest]
fn parquet_bytes_build_the_symmetric_matrix() {
    let bytes = write_parquet(&[commuter_batch()]);
    let source = ParquetFlowsSource::try_from_parquet_reader("commuters", bytes, &FlowColumns::default())
        .expect("valid parquet");
    assert_eq!(source.name(), "commuters");
    assert_eq!(source.flows().to_rows(), COMMUTER_FLOWS.map(Vec::from).to_vec());
    assert_eq!(source.table().codes(), CODES);
    assert_eq!(source.table().names(), NAMES);
}

#[rstest]
fn parquet_files_are_read_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("flows.parquet");
    std::fs::write(&path, write_parquet(&[commuter_batch()])).expect("write parquet");
    let source = ParquetFlowsSource::try_from_parquet_path("disk", &path, &FlowColumns::default())
        .expect("valid file");
    assert_eq!(source.node_count(), 4);
    assert_eq!(source.node_index("D"), Some(3));
}

#[rstest]
fn missing_files_surface_io_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ParquetFlowsSource::try_from_parquet_path(
        "missing",
        dir.path().join("absent.parquet"),
        &FlowColumns::default(),
    )
    .expect_err("file is absent");
    assert!(matches!(err, ParquetFlowsError::Io(_)), "unexpected error {err:?}");
}

#[rstest]
fn renamed_columns_and_single_precision_flows_are_accepted() {
    let batch = renamed_batch(vec!["x", "y"], vec![Some("y"), Some("y")], vec![Some(2.5), Some(1.0)]);
    let bytes = write_parquet(&[batch]);
    let source = ParquetFlowsSource::try_from_parquet_reader("renamed", bytes, &renamed_columns())
        .expect("valid parquet");
    assert_eq!(source.table().codes(), ["x", "y"]);
    assert_eq!(source.flows().to_rows(), vec![vec![0.0, 2.5], vec![2.5, 1.0]]);
    assert_eq!(source.node_name(0), Some(UNKNOWN_NODE_NAME));
}

#[rstest]
fn record_batches_accumulate_across_batches() {
    let first = renamed_batch(vec!["x"], vec![Some("y")], vec![Some(2.0)]);
    let second = renamed_batch(vec!["x"], vec![Some("y")], vec![Some(3.0)]);
    let source = ParquetFlowsSource::try_from_record_batches("batches", &[first, second], &renamed_columns())
        .expect("valid batches");
    assert_eq!(source.flows().get(0, 1), 5.0);
    assert_eq!(source.flows().get(1, 0), 5.0);
}

#[rstest]
fn default_columns_are_required() {
    let bytes = write_parquet(&[renamed_batch(vec!["x"], vec![Some("y")], vec![Some(1.0)])]);
    let err = ParquetFlowsSource::try_from_parquet_reader("renamed", bytes, &FlowColumns::default())
        .expect_err("default columns are absent");
    assert!(
        matches!(&err, ParquetFlowsError::ColumnNotFound { column } if column == "target_code"),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn empty_batches_are_rejected() {
    let batch = renamed_batch(Vec::new(), Vec::new(), Vec::new());
    let err = ParquetFlowsSource::try_from_record_batches("empty", &[batch], &renamed_columns())
        .expect_err("no records");
    assert!(
        matches!(&err, ParquetFlowsError::Flows(FlowsError::EmptyFlows)),
        "unexpected error {err:?}"
    );
}
