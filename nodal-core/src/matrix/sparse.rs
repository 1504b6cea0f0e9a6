//! CSR-backed flow matrix.

use ndarray::Array2;
use sprs::{CsMat, TriMat};

use super::{DenseFlows, FlowMatrix, check_flow};
use crate::error::{FlowsError, FlowsResult};

/// Flow matrix stored in compressed sparse row form.
///
/// Duplicate triplets are summed on construction, so raw edge lists can be
/// loaded without pre-aggregation.
///
/// # Examples
/// ```
/// use nodal_core::{FlowMatrix, SparseFlows};
///
/// let flows = SparseFlows::from_triplets(2, 2, [(0, 1, 3.0), (1, 0, 3.0), (0, 1, 1.0)])?;
/// assert_eq!(flows.get(0, 1), 4.0);
/// assert_eq!(flows.nnz(), 2);
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SparseFlows {
    matrix: CsMat<f64>,
}

impl SparseFlows {
    /// Builds a matrix from `(row, col, value)` triplets.
    ///
    /// # Errors
    /// Returns [`FlowsError::IndexOutOfBounds`] for a triplet outside the
    /// shape, [`FlowsError::NonFiniteFlow`] for NaN or infinite values and
    /// [`FlowsError::NegativeFlow`] for negative values.
    pub fn from_triplets<I>(rows: usize, cols: usize, triplets: I) -> FlowsResult<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut tri = TriMat::new((rows, cols));
        for (row, col, value) in triplets {
            if row >= rows || col >= cols {
                return Err(FlowsError::IndexOutOfBounds {
                    row,
                    col,
                    rows,
                    cols,
                });
            }
            check_flow(row, col, value)?;
            if value != 0.0 {
                tri.add_triplet(row, col, value);
            }
        }
        Ok(Self::from_tri(&tri))
    }

    /// An all-zero matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_tri(&TriMat::new((rows, cols)))
    }

    /// Borrows the underlying CSR matrix.
    #[must_use]
    pub const fn as_csr(&self) -> &CsMat<f64> {
        &self.matrix
    }

    /// Consumes the wrapper and returns the CSR matrix.
    #[must_use]
    pub fn into_csr(self) -> CsMat<f64> {
        self.matrix
    }

    pub(crate) fn from_tri(tri: &TriMat<f64>) -> Self {
        Self {
            matrix: tri.to_csr(),
        }
    }

    /// Builds a sparse matrix from a dense array, keeping entries that are
    /// nonzero and not below `threshold`.
    pub(crate) fn from_array(array: &Array2<f64>, threshold: f64) -> Self {
        let (rows, cols) = array.dim();
        let mut tri = TriMat::new((rows, cols));
        for ((row, col), &value) in array.indexed_iter() {
            if value != 0.0 && value >= threshold {
                tri.add_triplet(row, col, value);
            }
        }
        Self::from_tri(&tri)
    }

    /// Returns `selfᵀ`.
    #[must_use]
    pub(crate) fn transpose(&self) -> Self {
        let (rows, cols) = self.shape();
        let mut tri = TriMat::with_capacity((cols, rows), self.nnz());
        self.for_each_nonzero(|row, col, value| tri.add_triplet(col, row, value));
        Self::from_tri(&tri)
    }

    /// Sparse matrix product; inner dimensions must agree.
    #[must_use]
    pub(crate) fn matmul(&self, other: &Self) -> Self {
        let product = &self.matrix * &other.matrix;
        let mut out = Self { matrix: product };
        out.retain(|value| value != 0.0);
        out
    }
}

impl FlowMatrix for SparseFlows {
    fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col).copied().unwrap_or(0.0)
    }

    fn for_each_nonzero<F>(&self, mut visit: F)
    where
        F: FnMut(usize, usize, f64),
    {
        let row_major = self.matrix.is_csr();
        for (outer, lane) in self.matrix.outer_iterator().enumerate() {
            for (inner, &value) in lane.iter() {
                if value == 0.0 {
                    continue;
                }
                if row_major {
                    visit(outer, inner, value);
                } else {
                    visit(inner, outer, value);
                }
            }
        }
    }

    fn map_nonzero<F>(&self, mut map: F) -> Self
    where
        F: FnMut(usize, usize, f64) -> f64,
    {
        let mut tri = TriMat::with_capacity(self.shape(), self.nnz());
        self.for_each_nonzero(|row, col, value| {
            let mapped = map(row, col, value);
            if mapped != 0.0 {
                tri.add_triplet(row, col, mapped);
            }
        });
        Self::from_tri(&tri)
    }

    fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(f64) -> bool,
    {
        let mut tri = TriMat::with_capacity(self.shape(), self.nnz());
        self.for_each_nonzero(|row, col, value| {
            if keep(value) {
                tri.add_triplet(row, col, value);
            }
        });
        *self = Self::from_tri(&tri);
    }

    fn hadamard(&self, other: &Self) -> Self {
        self.map_nonzero(|row, col, value| value * other.get(row, col))
    }

    fn gram(&self) -> Self {
        self.matmul(&self.transpose())
    }

    fn to_sparse(&self) -> SparseFlows {
        self.clone()
    }

    fn to_dense(&self) -> DenseFlows {
        let mut array = Array2::zeros(self.shape());
        self.for_each_nonzero(|row, col, value| {
            if let Some(slot) = array.get_mut((row, col)) {
                *slot = value;
            }
        });
        DenseFlows::from_array_unchecked(array)
    }
}
