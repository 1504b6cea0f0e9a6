use std::sync::Arc;

use arrow_array::{ArrayRef, Float32Array, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use nodal_test_support::fixtures::COMMUTER_FLOWS;
use parquet::arrow::arrow_writer::ArrowWriter;

pub(crate) const CODES: [&str; 4] = ["A", "B", "C", "D"];
pub(crate) const NAMES: [&str; 4] = ["Alpha", "Bravo", "Charlie", "Delta"];

/// Upper triangle of `COMMUTER_FLOWS` as incoming flow records.
pub(crate) fn commuter_batch() -> RecordBatch {
    let mut target_codes = Vec::new();
    let mut target_names = Vec::new();
    let mut source_codes = Vec::new();
    let mut source_names = Vec::new();
    let mut flows = Vec::new();
    for (i, row) in COMMUTER_FLOWS.iter().enumerate() {
        for (j, &flow) in row.iter().enumerate().skip(i) {
            if flow > 0.0 {
                target_codes.push(CODES[i]);
                target_names.push(NAMES[i]);
                source_codes.push(CODES[j]);
                source_names.push(NAMES[j]);
                flows.push(flow);
            }
        }
    }
    let schema = Schema::new(vec![
        Field::new("target_code", DataType::Utf8, false),
        Field::new("target_name", DataType::Utf8, false),
        Field::new("source_code", DataType::Utf8, false),
        Field::new("source_name", DataType::Utf8, false),
        Field::new("flow", DataType::Float64, false),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(target_codes)) as ArrayRef,
            Arc::new(StringArray::from(target_names)),
            Arc::new(StringArray::from(source_codes)),
            Arc::new(StringArray::from(source_names)),
            Arc::new(Float64Array::from(flows)),
        ],
    )
    .expect("commuter batch is well formed")
}

/// Batch with custom column names, no name columns and `f32` flows.
pub(crate) fn renamed_batch(origins: Vec<&str>, destinations: Vec<Option<&str>>, trips: Vec<Option<f32>>) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("trips", DataType::Float32, true),
        Field::new("origin", DataType::Utf8, false),
        Field::new("destination", DataType::Utf8, true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Float32Array::from(trips)) as ArrayRef,
            Arc::new(StringArray::from(origins)),
            Arc::new(StringArray::from(destinations)),
        ],
    )
    .expect("renamed batch is well formed")
}

pub(crate) fn write_parquet(batches: &[RecordBatch]) -> Bytes {
    let schema = batches
        .first()
        .expect("at least one batch")
        .schema();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, None).expect("create writer");
    for batch in batches {
        writer.write(batch).expect("write batch");
    }
    writer.close().expect("close writer");
    Bytes::from(buffer)
}
