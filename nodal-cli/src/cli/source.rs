//! Flow sources selectable on the command line.
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use clap::{Args, Subcommand};
use nodal_core::{FlowTable, FlowsProvider};
use nodal_providers_parquet::{FlowColumns, ParquetFlowsSource};
use nodal_providers_text::TextFlowsSource;
use tracing::{Span, field, info, instrument};

use super::errors::CliError;

/// Where the flows come from.
#[derive(Debug, Subcommand, Clone)]
pub enum FlowSource {
    /// Tab-separated edge list with a header line.
    Text(TextArgs),
    /// Parquet edge table.
    Parquet(ParquetArgs),
}

/// Tab-separated input arguments.
#[derive(Debug, Args, Clone)]
pub struct TextArgs {
    /// Path to the edge list.
    pub path: PathBuf,

    /// Override name for the flow source (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,
}

/// Parquet input arguments.
#[derive(Debug, Args, Clone)]
pub struct ParquetArgs {
    /// Path to the Parquet file.
    pub path: PathBuf,

    /// Override name for the flow source (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Column holding the receiving node's code.
    #[arg(long, default_value = "target_code")]
    pub target_code_column: String,

    /// Column holding the receiving node's name.
    #[arg(long, default_value = "target_name")]
    pub target_name_column: String,

    /// Column holding the emitting node's code.
    #[arg(long, default_value = "source_code")]
    pub source_code_column: String,

    /// Column holding the emitting node's name.
    #[arg(long, default_value = "source_name")]
    pub source_name_column: String,

    /// Column holding the flow.
    #[arg(long, default_value = "flow")]
    pub flow_column: String,
}

impl ParquetArgs {
    fn columns(&self) -> FlowColumns {
        FlowColumns::default()
            .with_target_code(self.target_code_column.as_str())
            .with_target_name(self.target_name_column.as_str())
            .with_source_code(self.source_code_column.as_str())
            .with_source_name(self.source_name_column.as_str())
            .with_flow(self.flow_column.as_str())
    }
}

impl FlowSource {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Parquet(_) => "parquet",
        }
    }
}

/// Loads the flow table described by `source`.
#[instrument(
    name = "cli.load_flows",
    err,
    skip(source),
    fields(kind = source.kind(), path = field::Empty),
)]
pub(super) fn load_flows(source: &FlowSource) -> Result<FlowTable, CliError> {
    let table = match source {
        FlowSource::Text(args) => {
            Span::current().record("path", field::display(args.path.display()));
            let name = derive_source_name(&args.path, args.name.as_deref());
            let file = open_input(&args.path)?;
            TextFlowsSource::from_reader(name, BufReader::new(file))?.into_table()
        }
        FlowSource::Parquet(args) => {
            Span::current().record("path", field::display(args.path.display()));
            let name = derive_source_name(&args.path, args.name.as_deref());
            let file = open_input(&args.path)?;
            ParquetFlowsSource::try_from_parquet_reader(name, file, &args.columns())?.into_table()
        }
    };
    info!(
        source = table.name(),
        nodes = table.codes().len(),
        "loaded flows"
    );
    Ok(table)
}

pub(super) fn open_input(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn derive_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map_or_else(|| "flows".to_owned(), ToOwned::to_owned)
}
