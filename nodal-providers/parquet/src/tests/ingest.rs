use std::sync::Arc;

use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use rstest::rstest;

use super::support::renamed_batch;
use crate::{FlowColumns, ParquetFlowsError, ParquetFlowsSource};

fn renamed_columns() -> FlowColumns {
    FlowColumns::default()
        .with_target_code("destination")
        .with_source_code("origin")
        .with_flow("trips")
}

#[rstest]
#[case(vec![Some("y"), None], vec![Some(1.0), Some(2.0)], "destination", 1)]
#[case(vec![Some("y"), Some("y")], vec![Some(1.0), None], "trips", 1)]
fn null_cells_report_their_row(
    #[case] destinations: Vec<Option<&str>>,
    #[case] trips: Vec<Option<f32>>,
    #[case] column: &str,
    #[case] row: usize,
) {
    let batch = renamed_batch(vec!["x", "y"], destinations, trips);
    let err = ParquetFlowsSource::try_from_record_batches("nulls", &[batch], &renamed_columns())
        .expect_err("null cell");
    assert!(
        matches!(&err, ParquetFlowsError::NullValue { column: c, row: r } if c == column && *r == row),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn null_rows_are_counted_across_batches() {
    let first = renamed_batch(vec!["x", "y"], vec![Some("y"), Some("x")], vec![Some(1.0), Some(1.0)]);
    let second = renamed_batch(vec!["x"], vec![Some("y")], vec![None]);
    let err = ParquetFlowsSource::try_from_record_batches("nulls", &[first, second], &renamed_columns())
        .expect_err("null flow");
    assert!(
        matches!(err, ParquetFlowsError::NullValue { row: 2, .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn integer_flows_are_rejected() {
    let schema = Schema::new(vec![
        Field::new("target_code", DataType::Utf8, false),
        Field::new("source_code", DataType::Utf8, false),
        Field::new("flow", DataType::Int64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(vec!["a"])) as ArrayRef,
            Arc::new(StringArray::from(vec!["b"])),
            Arc::new(Int64Array::from(vec![4])),
        ],
    )
    .expect("batch");
    let err = ParquetFlowsSource::try_from_record_batches("ints", &[batch], &FlowColumns::default())
        .expect_err("integer flow column");
    assert!(
        matches!(
            &err,
            ParquetFlowsError::InvalidColumnType { column, actual: DataType::Int64, .. } if column == "flow"
        ),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn non_text_name_columns_are_rejected() {
    let schema = Schema::new(vec![
        Field::new("target_code", DataType::Utf8, false),
        Field::new("target_name", DataType::Int64, false),
        Field::new("source_code", DataType::Utf8, false),
        Field::new("flow", DataType::Float64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(vec!["a"])) as ArrayRef,
            Arc::new(Int64Array::from(vec![1])),
            Arc::new(StringArray::from(vec!["b"])),
            Arc::new(arrow_array::Float64Array::from(vec![1.0])),
        ],
    )
    .expect("batch");
    let err = ParquetFlowsSource::try_from_record_batches("names", &[batch], &FlowColumns::default())
        .expect_err("integer name column");
    assert!(
        matches!(&err, ParquetFlowsError::InvalidColumnType { column, .. } if column == "target_name"),
        "unexpected error {err:?}"
    );
}
