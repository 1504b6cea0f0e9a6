//! Conversion of Arrow record batches into flow records.
use arrow_array::{Array, ArrayRef, Float32Array, Float64Array, LargeStringArray, RecordBatch, StringArray};
use arrow_schema::{DataType, Schema};
use nodal_core::FlowTableBuilder;

use crate::{columns::FlowColumns, errors::ParquetFlowsError};

const TEXT_TYPES: &str = "Utf8 or LargeUtf8";
const FLOW_TYPES: &str = "Float64 or Float32";

#[derive(Clone, Copy)]
enum Kind {
    Text,
    Flow,
}

impl Kind {
    const fn expected(self) -> &'static str {
        match self {
            Self::Text => TEXT_TYPES,
            Self::Flow => FLOW_TYPES,
        }
    }

    const fn accepts(self, data_type: &DataType) -> bool {
        match self {
            Self::Text => matches!(data_type, DataType::Utf8 | DataType::LargeUtf8),
            Self::Flow => matches!(data_type, DataType::Float64 | DataType::Float32),
        }
    }
}

/// Positions of the configured columns inside one schema.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ColumnIndices {
    target_code: usize,
    target_name: Option<usize>,
    source_code: usize,
    source_name: Option<usize>,
    flow: usize,
}

impl ColumnIndices {
    /// Resolves and type-checks `columns` against `schema`.
    pub(crate) fn resolve(schema: &Schema, columns: &FlowColumns) -> Result<Self, ParquetFlowsError> {
        let required = |column: &str, kind: Kind| {
            let index = schema
                .index_of(column)
                .map_err(|_| ParquetFlowsError::ColumnNotFound {
                    column: column.to_owned(),
                })?;
            check_type(schema, index, column, kind)?;
            Ok::<_, ParquetFlowsError>(index)
        };
        let optional = |column: &str| {
            schema
                .index_of(column)
                .ok()
                .map(|index| check_type(schema, index, column, Kind::Text).map(|()| index))
                .transpose()
        };
        Ok(Self {
            target_code: required(columns.target_code(), Kind::Text)?,
            target_name: optional(columns.target_name())?,
            source_code: required(columns.source_code(), Kind::Text)?,
            source_name: optional(columns.source_name())?,
            flow: required(columns.flow(), Kind::Flow)?,
        })
    }
}

fn check_type(
    schema: &Schema,
    index: usize,
    column: &str,
    kind: Kind,
) -> Result<(), ParquetFlowsError> {
    let actual = schema.field(index).data_type();
    if kind.accepts(actual) {
        Ok(())
    } else {
        Err(ParquetFlowsError::InvalidColumnType {
            column: column.to_owned(),
            expected: kind.expected(),
            actual: actual.clone(),
        })
    }
}

/// Borrowed view of a text column.
enum TextColumn<'a> {
    Utf8(&'a StringArray),
    Large(&'a LargeStringArray),
}

impl<'a> TextColumn<'a> {
    fn wrap(array: &'a ArrayRef, column: &str) -> Result<Self, ParquetFlowsError> {
        if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
            return Ok(Self::Utf8(strings));
        }
        array
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(Self::Large)
            .ok_or_else(|| ParquetFlowsError::InvalidColumnType {
                column: column.to_owned(),
                expected: TEXT_TYPES,
                actual: array.data_type().clone(),
            })
    }

    fn get(&self, row: usize) -> Option<&'a str> {
        match self {
            Self::Utf8(strings) => (!strings.is_null(row)).then(|| strings.value(row)),
            Self::Large(strings) => (!strings.is_null(row)).then(|| strings.value(row)),
        }
    }
}

/// Borrowed view of the flow column.
enum FlowColumn<'a> {
    Double(&'a Float64Array),
    Single(&'a Float32Array),
}

impl<'a> FlowColumn<'a> {
    fn wrap(array: &'a ArrayRef, column: &str) -> Result<Self, ParquetFlowsError> {
        if let Some(values) = array.as_any().downcast_ref::<Float64Array>() {
            return Ok(Self::Double(values));
        }
        array
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(Self::Single)
            .ok_or_else(|| ParquetFlowsError::InvalidColumnType {
                column: column.to_owned(),
                expected: FLOW_TYPES,
                actual: array.data_type().clone(),
            })
    }

    fn get(&self, row: usize) -> Option<f64> {
        match self {
            Self::Double(values) => (!values.is_null(row)).then(|| values.value(row)),
            Self::Single(values) => (!values.is_null(row)).then(|| f64::from(values.value(row))),
        }
    }
}

/// Pushes every row of `batch` into `builder`.
///
/// `first_row` is the number of rows already consumed from earlier batches
/// and only serves error reporting. Returns the number of rows read.
pub(crate) fn append_batch(
    builder: &mut FlowTableBuilder,
    batch: &RecordBatch,
    indices: ColumnIndices,
    columns: &FlowColumns,
    first_row: usize,
) -> Result<usize, ParquetFlowsError> {
    let text = |index: usize, column: &str| TextColumn::wrap(batch.column(index), column);
    let target_codes = text(indices.target_code, columns.target_code())?;
    let source_codes = text(indices.source_code, columns.source_code())?;
    let target_names = indices
        .target_name
        .map(|index| text(index, columns.target_name()))
        .transpose()?;
    let source_names = indices
        .source_name
        .map(|index| text(index, columns.source_name()))
        .transpose()?;
    let flows = FlowColumn::wrap(batch.column(indices.flow), columns.flow())?;

    for row in 0..batch.num_rows() {
        let null = |column: &str| ParquetFlowsError::NullValue {
            column: column.to_owned(),
            row: first_row + row,
        };
        let target = target_codes
            .get(row)
            .ok_or_else(|| null(columns.target_code()))?;
        let source = source_codes
            .get(row)
            .ok_or_else(|| null(columns.source_code()))?;
        let flow = flows.get(row).ok_or_else(|| null(columns.flow()))?;
        builder.push(
            target,
            target_names.as_ref().and_then(|names| names.get(row)),
            source,
            source_names.as_ref().and_then(|names| names.get(row)),
            flow,
        );
    }
    Ok(batch.num_rows())
}
