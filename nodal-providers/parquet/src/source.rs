//! Flow tables read from Parquet edge lists.
use std::{fs::File, path::Path};

use arrow_array::{RecordBatch, RecordBatchReader};
use nodal_core::{FlowTable, FlowTableBuilder, FlowsProvider, SparseFlows};
use parquet::{
    arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder},
    file::reader::ChunkReader,
};
use tracing::{debug, info, instrument};

use crate::{
    columns::FlowColumns,
    errors::ParquetFlowsError,
    ingest::{ColumnIndices, append_batch},
};

/// Symmetric flows loaded from a columnar table of incoming flows.
///
/// Each row holds one flow from `source_code` into `target_code`. Only the
/// configured columns are decoded.
#[derive(Clone, Debug)]
pub struct ParquetFlowsSource {
    table: FlowTable,
}

impl ParquetFlowsSource {
    /// Loads the Parquet file at `path`.
    ///
    /// # Errors
    /// Returns [`ParquetFlowsError::Io`] when the file cannot be opened and
    /// the errors of [`ParquetFlowsSource::try_from_parquet_reader`]
    /// otherwise.
    pub fn try_from_parquet_path(
        name: impl AsRef<str>,
        path: impl AsRef<Path>,
        columns: &FlowColumns,
    ) -> Result<Self, ParquetFlowsError> {
        let file = File::open(path)?;
        Self::try_from_parquet_reader(name, file, columns)
    }

    /// Loads flows from any Parquet chunk reader.
    ///
    /// # Errors
    /// Returns [`ParquetFlowsError::Parquet`] for undecodable input,
    /// [`ParquetFlowsError::ColumnNotFound`] or
    /// [`ParquetFlowsError::InvalidColumnType`] for a schema that does not
    /// fit `columns`, [`ParquetFlowsError::NullValue`] for a null code or
    /// flow and [`ParquetFlowsError::Flows`] when the rows do not form a
    /// valid flow table.
    #[instrument(name = "parquet.read_flows", err, skip_all, fields(source = %name.as_ref()))]
    pub fn try_from_parquet_reader<R>(
        name: impl AsRef<str>,
        reader: R,
        columns: &FlowColumns,
    ) -> Result<Self, ParquetFlowsError>
    where
        R: ChunkReader + Send + 'static,
    {
        let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
        let mask = ProjectionMask::columns(builder.parquet_schema(), columns.all());
        let batches = builder.with_projection(mask).build()?;
        let indices = ColumnIndices::resolve(&batches.schema(), columns)?;
        let mut table = FlowTableBuilder::new(name.as_ref());
        let mut rows = 0_usize;
        for batch in batches {
            let batch = batch?;
            rows += append_batch(&mut table, &batch, indices, columns, rows)?;
            debug!(rows, "decoded record batch");
        }
        info!(records = rows, "read flow records");
        Ok(Self {
            table: table.build()?,
        })
    }

    /// Loads flows from in-memory Arrow batches.
    ///
    /// Each batch is checked against `columns` on its own, so batches may
    /// order their columns differently.
    ///
    /// # Errors
    /// See [`ParquetFlowsSource::try_from_parquet_reader`].
    pub fn try_from_record_batches(
        name: impl AsRef<str>,
        batches: &[RecordBatch],
        columns: &FlowColumns,
    ) -> Result<Self, ParquetFlowsError> {
        let mut table = FlowTableBuilder::new(name.as_ref());
        let mut rows = 0_usize;
        for batch in batches {
            let indices = ColumnIndices::resolve(&batch.schema(), columns)?;
            rows += append_batch(&mut table, batch, indices, columns, rows)?;
        }
        Ok(Self {
            table: table.build()?,
        })
    }

    /// Borrows the underlying flow table.
    #[must_use]
    pub const fn table(&self) -> &FlowTable {
        &self.table
    }

    /// Consumes the source and returns its flow table.
    #[must_use]
    pub fn into_table(self) -> FlowTable {
        self.table
    }
}

impl FlowsProvider for ParquetFlowsSource {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn flows(&self) -> &SparseFlows {
        self.table.flows()
    }

    fn node_code(&self, index: usize) -> Option<&str> {
        self.table.node_code(index)
    }

    fn node_name(&self, index: usize) -> Option<&str> {
        self.table.node_name(index)
    }

    fn node_index(&self, code: &str) -> Option<usize> {
        self.table.node_index(code)
    }
}
