//! Node to center assignments.

use std::{collections::BTreeSet, ops::Index};

use sprs::TriMat;

use crate::{
    error::{FlowsError, FlowsResult},
    matrix::SparseFlows,
};

/// One hierarchy level: `assignment[i]` is the index of node `i`'s center.
///
/// Centers are always node indices in `0..len`, never synthetic ids.
///
/// # Examples
/// ```
/// use nodal_core::Assignment;
///
/// let assignment = Assignment::new(vec![0, 0, 2, 2, 2])?;
/// assert_eq!(assignment.centers(), vec![0, 2]);
/// assert_eq!(assignment.center_count(), 2);
/// assert!(Assignment::new(vec![0, 7]).is_err());
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Assignment(Vec<usize>);

impl Assignment {
    /// Validates that every center lies in `0..centers.len()`.
    ///
    /// # Errors
    /// Returns [`FlowsError::CenterOutOfRange`] for the first invalid entry.
    pub fn new(centers: Vec<usize>) -> FlowsResult<Self> {
        let nodes = centers.len();
        if let Some((node, &center)) = centers.iter().enumerate().find(|(_, c)| **c >= nodes) {
            return Err(FlowsError::CenterOutOfRange {
                node,
                center,
                nodes,
            });
        }
        Ok(Self(centers))
    }

    /// Every node is its own center.
    #[must_use]
    pub fn identity(nodes: usize) -> Self {
        Self((0..nodes).collect())
    }

    /// Wraps a vector already known to be valid.
    pub(crate) const fn from_vec_unchecked(centers: Vec<usize>) -> Self {
        Self(centers)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the assignment covers no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Center of `node`, if `node` is in range.
    #[must_use]
    pub fn center_of(&self, node: usize) -> Option<usize> {
        self.0.get(node).copied()
    }

    /// Borrows the raw center indices.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Consumes the assignment and returns the raw center indices.
    #[must_use]
    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// Iterates the center of every node in order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Whether every node is its own center.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.iter().enumerate().all(|(node, center)| node == center)
    }

    /// Distinct centers in ascending order.
    #[must_use]
    pub fn centers(&self) -> Vec<usize> {
        self.0.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Number of distinct centers.
    #[must_use]
    pub fn center_count(&self) -> usize {
        self.centers().len()
    }

    /// Maps every node index to the position of its center among
    /// [`Assignment::centers`]. Entries for nodes that are not centers are
    /// `None`.
    #[must_use]
    pub fn compact_indices(&self) -> Vec<Option<usize>> {
        let mut positions = vec![None; self.len()];
        for (position, center) in self.centers().into_iter().enumerate() {
            if let Some(slot) = positions.get_mut(center) {
                *slot = Some(position);
            }
        }
        positions
    }

    /// Sums `weights` per center, indexed by the center's node index.
    ///
    /// Non-center entries are zero.
    ///
    /// # Errors
    /// Returns [`FlowsError::NodeSizesMismatch`] when `weights` does not have
    /// one entry per node.
    pub fn group_sums(&self, weights: &[f64]) -> FlowsResult<Vec<f64>> {
        if weights.len() != self.len() {
            return Err(FlowsError::NodeSizesMismatch {
                nodes: self.len(),
                sizes: weights.len(),
            });
        }
        let mut sums = vec![0.0; self.len()];
        for (center, weight) in self.iter().zip(weights) {
            if let Some(sum) = sums.get_mut(center) {
                *sum += weight;
            }
        }
        Ok(sums)
    }

    /// The `K x N` summation matrix whose row `k` holds a one in every column
    /// assigned to the `k`-th center.
    #[must_use]
    pub fn grouping_matrix(&self) -> SparseFlows {
        let positions = self.compact_indices();
        let groups = self.center_count();
        let mut tri = TriMat::with_capacity((groups, self.len()), self.len());
        for (node, center) in self.iter().enumerate() {
            if let Some(Some(group)) = positions.get(center) {
                tri.add_triplet(*group, node, 1.0);
            }
        }
        SparseFlows::from_tri(&tri)
    }
}

/// Panics when `node` is out of range, like slice indexing.
impl Index<usize> for Assignment {
    type Output = usize;

    #[expect(clippy::indexing_slicing, reason = "same contract as slice indexing")]
    fn index(&self, node: usize) -> &Self::Output {
        &self.0[node]
    }
}

impl TryFrom<Vec<usize>> for Assignment {
    type Error = FlowsError;

    fn try_from(centers: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(centers)
    }
}

impl AsRef<[usize]> for Assignment {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlowMatrix;

    #[test]
    fn identity_is_its_own_center_set() {
        let identity = Assignment::identity(4);
        assert!(identity.is_identity());
        assert_eq!(identity.centers(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn out_of_range_center_is_reported() {
        let err = Assignment::new(vec![0, 1, 3]).expect_err("3 is out of range");
        assert_eq!(
            err,
            FlowsError::CenterOutOfRange {
                node: 2,
                center: 3,
                nodes: 3
            }
        );
    }

    #[test]
    fn group_sums_accumulate_on_center_indices() {
        let assignment = Assignment::new(vec![1, 1, 3, 3]).expect("valid");
        let sums = assignment
            .group_sums(&[1.0, 2.0, 4.0, 8.0])
            .expect("weights match");
        assert_eq!(sums, vec![0.0, 3.0, 0.0, 12.0]);
    }

    #[test]
    fn compact_indices_follow_sorted_centers() {
        let assignment = Assignment::new(vec![3, 0, 3, 3]).expect("valid");
        assert_eq!(assignment.compact_indices(), vec![Some(0), None, None, Some(1)]);
    }

    #[test]
    fn grouping_matrix_has_one_entry_per_node() {
        let assignment = Assignment::new(vec![0, 1, 0, 3, 1, 1, 6]).expect("valid");
        let grouping = assignment.grouping_matrix();
        assert_eq!(grouping.shape(), (4, 7));
        assert_eq!(grouping.nnz(), 7);
        assert_eq!(grouping.row_sums(), vec![2.0, 3.0, 1.0, 1.0]);
        assert_eq!(grouping.get(1, 5), 1.0);
    }
}
