//! Benchmark setup error type.
//!
//! Lets setup code propagate failures with `?` instead of `.expect()`.

use nodal_core::{DetectorError, FlowsError};

use crate::synthetic::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic flow generation failed.
    #[error("synthetic flow generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Building or extending the detector failed.
    #[error("center detection failed: {0}")]
    Detector(#[from] DetectorError),
    /// A flow transformation failed.
    #[error("flow transformation failed: {0}")]
    Flows(#[from] FlowsError),
}
