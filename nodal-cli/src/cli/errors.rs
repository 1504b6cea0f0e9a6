use std::{io, path::PathBuf};

use nodal_core::{DetectorError, FlowsError};
use nodal_providers_parquet::ParquetFlowsError;
use nodal_providers_text::TextFlowsError;
use thiserror::Error;

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing a tab-separated table failed.
    #[error(transparent)]
    Text(#[from] TextFlowsError),
    /// Reading a Parquet edge table failed.
    #[error(transparent)]
    Parquet(#[from] ParquetFlowsError),
    /// Center detection failed.
    #[error(transparent)]
    Detector(#[from] DetectorError),
    /// A flow transformation failed outside the detector.
    #[error(transparent)]
    Flows(#[from] FlowsError),
}

impl CliError {
    /// Stable code of the underlying core error, if any.
    ///
    /// Provider errors caused by invalid flows report the flow error's code.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Detector(err) => Some(err.code().as_str()),
            Self::Flows(err)
            | Self::Text(TextFlowsError::Flows(err))
            | Self::Parquet(ParquetFlowsError::Flows(err)) => Some(err.code().as_str()),
            _ => None,
        }
    }

    /// Code of the flow error wrapped by a detector failure.
    #[must_use]
    pub fn flows_code(&self) -> Option<&'static str> {
        match self {
            Self::Detector(err) => err.flows_code().map(|code| code.as_str()),
            _ => None,
        }
    }
}
