//! Array-backed flow matrix.

use ndarray::Array2;

use super::{FlowMatrix, SparseFlows, check_flow};
use crate::error::{FlowsError, FlowsResult};

/// Flow matrix stored as a dense row-major array.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseFlows {
    array: Array2<f64>,
}

impl DenseFlows {
    /// Wraps an existing array after validating every entry.
    ///
    /// # Errors
    /// Returns [`FlowsError::NonFiniteFlow`] or [`FlowsError::NegativeFlow`]
    /// for the first entry that is not a valid flow magnitude.
    pub fn new(array: Array2<f64>) -> FlowsResult<Self> {
        for ((row, col), &value) in array.indexed_iter() {
            check_flow(row, col, value)?;
        }
        Ok(Self { array })
    }

    /// Builds a square matrix from nested rows.
    ///
    /// # Errors
    /// Returns [`FlowsError::NonSquare`] when a row's length differs from the
    /// number of rows, plus the entry errors of [`DenseFlows::new`].
    ///
    /// # Examples
    /// ```
    /// use nodal_core::{DenseFlows, FlowMatrix};
    ///
    /// let flows = DenseFlows::from_rows(&[[0.0, 2.0], [2.0, 1.0]])?;
    /// assert_eq!(flows.row_sums(), vec![2.0, 3.0]);
    /// # Ok::<(), nodal_core::FlowsError>(())
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> FlowsResult<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for row in rows {
            let row = row.as_ref();
            if row.len() != size {
                return Err(FlowsError::NonSquare {
                    rows: size,
                    cols: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        let array = Array2::from_shape_vec((size, size), values).map_err(|_| {
            FlowsError::NonSquare {
                rows: size,
                cols: size,
            }
        })?;
        Self::new(array)
    }

    /// Borrows the underlying array.
    #[must_use]
    pub const fn as_array(&self) -> &Array2<f64> {
        &self.array
    }

    /// Consumes the wrapper and returns the array.
    #[must_use]
    pub fn into_array(self) -> Array2<f64> {
        self.array
    }

    pub(crate) const fn from_array_unchecked(array: Array2<f64>) -> Self {
        Self { array }
    }

    pub(crate) fn rows(&self) -> Vec<Vec<f64>> {
        self.array.rows().into_iter().map(|row| row.to_vec()).collect()
    }
}

impl FlowMatrix for DenseFlows {
    fn shape(&self) -> (usize, usize) {
        self.array.dim()
    }

    fn nnz(&self) -> usize {
        self.array.iter().filter(|value| **value != 0.0).count()
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.array.get((row, col)).copied().unwrap_or(0.0)
    }

    fn for_each_nonzero<F>(&self, mut visit: F)
    where
        F: FnMut(usize, usize, f64),
    {
        for ((row, col), &value) in self.array.indexed_iter() {
            if value != 0.0 {
                visit(row, col, value);
            }
        }
    }

    fn map_nonzero<F>(&self, mut map: F) -> Self
    where
        F: FnMut(usize, usize, f64) -> f64,
    {
        let mut array = self.array.clone();
        for ((row, col), value) in array.indexed_iter_mut() {
            if *value != 0.0 {
                *value = map(row, col, *value);
            }
        }
        Self { array }
    }

    fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(f64) -> bool,
    {
        self.array
            .mapv_inplace(|value| if keep(value) { value } else { 0.0 });
    }

    fn hadamard(&self, other: &Self) -> Self {
        self.map_nonzero(|row, col, value| value * other.get(row, col))
    }

    fn gram(&self) -> Self {
        Self {
            array: self.array.dot(&self.array.t()),
        }
    }

    fn to_sparse(&self) -> SparseFlows {
        SparseFlows::from_array(&self.array, f64::NEG_INFINITY)
    }

    fn to_dense(&self) -> DenseFlows {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0]];
        let err = DenseFlows::from_rows(&rows).expect_err("second row is short");
        assert_eq!(err, FlowsError::NonSquare { rows: 2, cols: 1 });
    }

    #[test]
    fn sparse_round_trip_preserves_values() {
        let flows = DenseFlows::from_rows(&[[0.0, 1.5], [1.5, 4.0]]).expect("fixture is valid");
        let sparse = flows.to_sparse();
        assert_eq!(sparse.nnz(), 3);
        assert_eq!(sparse.to_dense(), flows);
    }

    #[test]
    fn map_nonzero_leaves_zero_entries_untouched() {
        let flows = DenseFlows::from_rows(&[[0.0, 2.0], [1.0, 0.0]]).expect("fixture is valid");
        let mapped = flows.map_nonzero(|_, _, value| value + 10.0);
        assert_eq!(mapped.to_rows(), vec![vec![0.0, 12.0], vec![11.0, 0.0]]);
    }
}
