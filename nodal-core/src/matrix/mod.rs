//! Weighted adjacency matrices backing every flow computation.
//!
//! [`SparseFlows`] wraps a CSR matrix from `sprs` and [`DenseFlows`] a
//! row-major `ndarray` array. Both implement [`FlowMatrix`], so every
//! transformation whose output mirrors its input is written once and
//! dispatched statically.

mod dense;
mod sparse;

use std::{fmt, str::FromStr};

pub use self::{dense::DenseFlows, sparse::SparseFlows};

use crate::error::{FlowsError, FlowsResult};

/// Row normalisation applied before similarity products and scoring.
///
/// # Examples
/// ```
/// use nodal_core::Norm;
///
/// let norm: Norm = "l2".parse()?;
/// assert_eq!(norm, Norm::L2);
/// assert!("l3".parse::<Norm>().is_err());
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Norm {
    /// Sum of absolute values.
    L1,
    /// Euclidean length.
    L2,
    /// Largest absolute value.
    Max,
}

impl Norm {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
            Self::Max => "max",
        }
    }

    fn accumulate(self, acc: f64, value: f64) -> f64 {
        match self {
            Self::L1 => acc + value.abs(),
            Self::L2 => value.mul_add(value, acc),
            Self::Max => acc.max(value.abs()),
        }
    }

    fn finish(self, acc: f64) -> f64 {
        match self {
            Self::L2 => acc.sqrt(),
            Self::L1 | Self::Max => acc,
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Norm {
    type Err = FlowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l1" => Ok(Self::L1),
            "l2" => Ok(Self::L2),
            "max" => Ok(Self::Max),
            _ => Err(FlowsError::InvalidNorm {
                provided: s.to_owned(),
            }),
        }
    }
}

/// Capability shared by sparse and dense flow matrices.
///
/// Implementors enumerate their structurally nonzero entries in row-major
/// order and rebuild themselves from a per-entry mapping, which is all the
/// feature extractor and the scorer need. Zero entries are never visited, so
/// sparse matrices are processed in `O(nnz)`.
pub trait FlowMatrix: Clone + fmt::Debug {
    /// Returns `(rows, cols)`.
    fn shape(&self) -> (usize, usize);

    /// Returns the number of structurally nonzero entries.
    fn nnz(&self) -> usize;

    /// Returns the value at `(row, col)`, or zero when it is not stored.
    fn get(&self, row: usize, col: usize) -> f64;

    /// Visits every nonzero entry in row-major order.
    fn for_each_nonzero<F>(&self, visit: F)
    where
        F: FnMut(usize, usize, f64);

    /// Builds a matrix of the same representation whose nonzero positions
    /// are a subset of `self`'s, each replaced by `map(row, col, value)`.
    ///
    /// Zero results are dropped from sparse storage.
    #[must_use]
    fn map_nonzero<F>(&self, map: F) -> Self
    where
        F: FnMut(usize, usize, f64) -> f64;

    /// Keeps only the entries whose value satisfies `keep`.
    fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(f64) -> bool;

    /// Elementwise product with a matrix of the same shape.
    #[must_use]
    fn hadamard(&self, other: &Self) -> Self;

    /// Computes `self · selfᵀ`.
    #[must_use]
    fn gram(&self) -> Self;

    /// Converts into the sparse representation.
    fn to_sparse(&self) -> SparseFlows;

    /// Converts into the dense representation.
    fn to_dense(&self) -> DenseFlows;

    /// Number of rows, i.e. nodes for a square flow matrix.
    fn node_count(&self) -> usize {
        self.shape().0
    }

    /// Whether the matrix is square.
    fn is_square(&self) -> bool {
        let (rows, cols) = self.shape();
        rows == cols
    }

    /// Sum of each row.
    fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.shape().0];
        self.for_each_nonzero(|row, _, value| {
            if let Some(sum) = sums.get_mut(row) {
                *sum += value;
            }
        });
        sums
    }

    /// Sum of each column.
    fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.shape().1];
        self.for_each_nonzero(|_, col, value| {
            if let Some(sum) = sums.get_mut(col) {
                *sum += value;
            }
        });
        sums
    }

    /// Sum of every entry.
    fn total(&self) -> f64 {
        let mut total = 0.0;
        self.for_each_nonzero(|_, _, value| total += value);
        total
    }

    /// Main diagonal, zero-filled past the shorter dimension.
    fn diagonal(&self) -> Vec<f64> {
        let (rows, cols) = self.shape();
        (0..rows.min(cols)).map(|i| self.get(i, i)).collect()
    }

    /// Norm of every row.
    fn row_norms(&self, norm: Norm) -> Vec<f64> {
        let mut acc = vec![0.0; self.shape().0];
        self.for_each_nonzero(|row, _, value| {
            if let Some(slot) = acc.get_mut(row) {
                *slot = norm.accumulate(*slot, value);
            }
        });
        acc.into_iter().map(|value| norm.finish(value)).collect()
    }

    /// Divides every row by its norm. Rows with a zero norm become empty.
    #[must_use]
    fn normalize_rows(&self, norm: Norm) -> Self {
        let norms = self.row_norms(norm);
        self.map_nonzero(|row, _, value| {
            safe_ratio(value, norms.get(row).copied().unwrap_or(0.0))
        })
    }

    /// Dense copy as nested rows.
    fn to_rows(&self) -> Vec<Vec<f64>> {
        self.to_dense().rows()
    }
}

/// Removes every entry whose magnitude is strictly below `threshold`.
///
/// Sparse storage shrinks; dense entries become zero. Applying the filter
/// again with the same or a smaller threshold changes nothing, and a
/// threshold of zero or less is a no-op.
///
/// # Examples
/// ```
/// use nodal_core::{DenseFlows, FlowMatrix, filter_small_values};
///
/// let mut flows = DenseFlows::from_rows(&[[1.0, 0.2], [0.05, 3.0]])?;
/// filter_small_values(&mut flows, 0.5);
/// assert_eq!(flows.to_rows(), vec![vec![1.0, 0.0], vec![0.0, 3.0]]);
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
pub fn filter_small_values<M: FlowMatrix>(matrix: &mut M, threshold: f64) -> &mut M {
    matrix.retain(|value| value.abs() >= threshold);
    matrix
}

/// Divides `numerator` by `denominator`, yielding zero for a zero or
/// non-finite denominator.
pub(crate) fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Rejects entries that cannot represent a flow magnitude.
pub(crate) fn check_flow(row: usize, col: usize, value: f64) -> FlowsResult<()> {
    if !value.is_finite() {
        return Err(FlowsError::NonFiniteFlow { row, col });
    }
    if value < 0.0 {
        return Err(FlowsError::NegativeFlow { row, col, value });
    }
    Ok(())
}
