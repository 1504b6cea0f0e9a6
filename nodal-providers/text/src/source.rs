//! Flow tables read from tab-separated edge lists.
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use nodal_core::{FlowTable, FlowTableBuilder, FlowsProvider, SparseFlows};
use tracing::{info, instrument};

use crate::{
    errors::TextFlowsError,
    tsv::{self, Header},
};

/// Column holding the code of the node receiving the flow.
pub const TARGET_CODE_COLUMN: &str = "target_code";
/// Optional column holding the name of the receiving node.
pub const TARGET_NAME_COLUMN: &str = "target_name";
/// Column holding the code of the node emitting the flow.
pub const SOURCE_CODE_COLUMN: &str = "source_code";
/// Optional column holding the name of the emitting node.
pub const SOURCE_NAME_COLUMN: &str = "source_name";
/// Column holding the flow magnitude.
pub const FLOW_COLUMN: &str = "flow";

/// Symmetric flows loaded from a tab-separated file of incoming flows.
///
/// Columns are located by header name and may appear in any order; the two
/// name columns are optional.
///
/// # Examples
/// ```
/// use nodal_core::{FlowMatrix, FlowsProvider};
/// use nodal_providers_text::TextFlowsSource;
///
/// let data = "target_code\tsource_code\tflow\nA\tB\t3\nB\tB\t1\n";
/// let source = TextFlowsSource::from_reader("demo", data.as_bytes())?;
/// assert_eq!(source.node_count(), 2);
/// assert_eq!(source.flows().get(0, 1), 3.0);
/// assert_eq!(source.node_name(0), Some("UNKNOWN"));
/// # Ok::<(), nodal_providers_text::TextFlowsError>(())
/// ```
#[derive(Clone, Debug)]
pub struct TextFlowsSource {
    table: FlowTable,
}

struct Columns {
    target_code: usize,
    target_name: Option<usize>,
    source_code: usize,
    source_name: Option<usize>,
    flow: usize,
}

impl Columns {
    fn resolve(header: &Header) -> Result<Self, TextFlowsError> {
        Ok(Self {
            target_code: header.require(TARGET_CODE_COLUMN)?,
            target_name: header.position(TARGET_NAME_COLUMN),
            source_code: header.require(SOURCE_CODE_COLUMN)?,
            source_name: header.position(SOURCE_NAME_COLUMN),
            flow: header.require(FLOW_COLUMN)?,
        })
    }
}

impl TextFlowsSource {
    /// Reads the file at `path`, naming the source after the file stem.
    ///
    /// # Errors
    /// Returns [`TextFlowsError::Io`] when the file cannot be read and the
    /// errors of [`TextFlowsSource::from_reader`] otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TextFlowsError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned());
        let file = File::open(path)?;
        Self::from_reader(name, BufReader::new(file))
    }

    /// Reads incoming flows from `reader`.
    ///
    /// # Errors
    /// Returns [`TextFlowsError::MissingHeader`] for empty input,
    /// [`TextFlowsError::ColumnNotFound`] when a required column is missing,
    /// [`TextFlowsError::MissingField`] for a short line,
    /// [`TextFlowsError::InvalidFlow`] for a non-numeric flow and
    /// [`TextFlowsError::Flows`] when no record was read or a flow is
    /// negative or not finite.
    #[instrument(name = "text.read_flows", err, skip_all, fields(source = %name.as_ref()))]
    pub fn from_reader<R: BufRead>(
        name: impl AsRef<str>,
        reader: R,
    ) -> Result<Self, TextFlowsError> {
        let (header, rows) = tsv::read_table(reader)?;
        let columns = Columns::resolve(&header)?;
        let mut builder = FlowTableBuilder::new(name.as_ref());
        for (line, text) in &rows {
            let fields: Vec<&str> = tsv::split(text).collect();
            let cell = |position: usize| tsv::field(&fields, position, *line, &header);
            let optional = |position: Option<usize>| position.map(cell).transpose();
            let raw_flow = cell(columns.flow)?;
            let flow = raw_flow
                .trim()
                .parse::<f64>()
                .map_err(|_| TextFlowsError::InvalidFlow {
                    line: *line,
                    value: raw_flow.to_owned(),
                })?;
            builder.push(
                cell(columns.target_code)?,
                optional(columns.target_name)?,
                cell(columns.source_code)?,
                optional(columns.source_name)?,
                flow,
            );
        }
        info!(records = rows.len(), "read flow records");
        Ok(Self {
            table: builder.build()?,
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

impl FlowsProvider for TextFlowsSource {
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
