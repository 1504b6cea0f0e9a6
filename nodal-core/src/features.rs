//! Stateless flow transformations.
//!
//! Everything here is a pure function of its inputs: profile similarity,
//! distance-decayed ("local") flows and transitive ("indirect") flow
//! propagation.

use std::{fmt, str::FromStr};

use tracing::{debug, instrument};

use crate::{
    error::{FlowsError, FlowsResult},
    matrix::{FlowMatrix, Norm, SparseFlows, safe_ratio},
};

/// Default threshold below which propagated flows are discarded.
pub const DEFAULT_INDIRECT_FLOW_THRESHOLD: f64 = 0.1;

/// How the sizes of two nodes are combined into a distance normaliser.
///
/// # Examples
/// ```
/// use nodal_core::DistanceType;
///
/// let kind: DistanceType = "geometric-mean".parse()?;
/// assert_eq!(kind, DistanceType::GeometricMean);
/// assert_eq!(kind.to_string(), "geometric-mean");
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DistanceType {
    /// `flow / sqrt(size_i * size_j)`.
    #[default]
    GeometricMean,
    /// `2 * flow / (size_i + size_j)`.
    ArithmeticMean,
}

impl DistanceType {
    /// Returns the canonical kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GeometricMean => "geometric-mean",
            Self::ArithmeticMean => "arithmetic-mean",
        }
    }

    fn weight(self, flow: f64, source_size: f64, target_size: f64) -> f64 {
        match self {
            Self::GeometricMean => safe_ratio(flow, (source_size * target_size).sqrt()),
            Self::ArithmeticMean => safe_ratio(2.0 * flow, source_size + target_size),
        }
    }
}

impl fmt::Display for DistanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceType {
    type Err = FlowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "geometric-mean" | "geometric" => Ok(Self::GeometricMean),
            "arithmetic-mean" | "arithmetic" => Ok(Self::ArithmeticMean),
            _ => Err(FlowsError::InvalidDistanceType {
                provided: s.to_owned(),
            }),
        }
    }
}

/// Pairwise similarity of flow profiles.
///
/// Rows are normalised under `norm` and multiplied by their own transpose, so
/// two nodes with proportional flows score the same regardless of volume.
/// Rows with zero norm yield an all-zero similarity row and zeros are not
/// stored in sparse output.
///
/// # Examples
/// ```
/// use nodal_core::{DenseFlows, FlowMatrix, Norm, build_similarity_matrix};
///
/// let flows = DenseFlows::from_rows(&[[2.0, 0.0], [4.0, 0.0]])?;
/// let similarity = build_similarity_matrix(&flows, Norm::L2);
/// assert_eq!(similarity.get(0, 1), 1.0);
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[must_use]
pub fn build_similarity_matrix<M: FlowMatrix>(flows: &M, norm: Norm) -> M {
    debug!(nodes = flows.node_count(), %norm, "computing similarity matrix");
    let normalized = flows.normalize_rows(norm);
    let mut similarity = normalized.gram();
    similarity.retain(|value| value != 0.0);
    similarity
}

/// Distance-decay weight for every nonzero flow.
///
/// Only structurally nonzero positions are computed and the output keeps the
/// input's representation.
///
/// # Errors
/// Returns [`FlowsError::NonSquare`] for a rectangular matrix and
/// [`FlowsError::NodeSizesMismatch`] when `node_sizes` does not have one entry
/// per row.
pub fn build_inverse_distances_matrix<M: FlowMatrix>(
    flows: &M,
    node_sizes: &[f64],
    distance_type: DistanceType,
) -> FlowsResult<M> {
    ensure_square(flows)?;
    if node_sizes.len() != flows.node_count() {
        return Err(FlowsError::NodeSizesMismatch {
            nodes: flows.node_count(),
            sizes: node_sizes.len(),
        });
    }
    let size_of = |node: usize| node_sizes.get(node).copied().unwrap_or(0.0);
    Ok(flows.map_nonzero(|row, col, flow| distance_type.weight(flow, size_of(row), size_of(col))))
}

/// Flows multiplied by their own inverse distances.
///
/// # Errors
/// Propagates the errors of [`build_inverse_distances_matrix`].
///
/// # Examples
/// ```
/// use nodal_core::{DenseFlows, DistanceType, FlowMatrix, get_local_flows_matrix};
///
/// let flows = DenseFlows::from_rows(&[[4.0, 0.0], [0.0, 9.0]])?;
/// let local = get_local_flows_matrix(&flows, &flows.row_sums(), DistanceType::GeometricMean)?;
/// assert_eq!(local.get(0, 0), 4.0);
/// assert_eq!(local.get(1, 1), 9.0);
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
pub fn get_local_flows_matrix<M: FlowMatrix>(
    flows: &M,
    node_sizes: &[f64],
    distance_type: DistanceType,
) -> FlowsResult<M> {
    let inverse_distances = build_inverse_distances_matrix(flows, node_sizes, distance_type)?;
    Ok(flows.hadamard(&inverse_distances))
}

/// Transitive flows obtained by repeatedly squaring the row-stochastic flow
/// proportions.
///
/// `degree` squarings give a propagation depth of `2^degree` hops. The
/// proportions are rescaled by the original row sums so every node keeps its
/// total out-flow, then entries below `min_value_threshold` are dropped.
/// Degree zero returns `direct` unchanged in sparse form.
///
/// The computation densifies the matrix, so memory grows with the square of
/// the node count.
///
/// # Errors
/// Returns [`FlowsError::InvalidDegree`] for a negative degree and
/// [`FlowsError::NonSquare`] for a rectangular matrix.
#[instrument(
    name = "core.indirect_flows",
    level = "debug",
    err,
    skip(direct),
    fields(nodes = direct.node_count(), nnz = direct.nnz()),
)]
pub fn get_indirect_flows_matrix<M: FlowMatrix>(
    direct: &M,
    degree: i64,
    min_value_threshold: f64,
) -> FlowsResult<SparseFlows> {
    let squarings = usize::try_from(degree).map_err(|_| FlowsError::InvalidDegree { degree })?;
    ensure_square(direct)?;
    if squarings == 0 {
        debug!("degree 0 indirect flows are the direct flows");
        return Ok(direct.to_sparse());
    }

    let dense = direct.to_dense();
    let mass = dense.row_sums();
    let mut proportions = dense.normalize_rows(Norm::L1).into_array();
    for step in 1..=squarings {
        proportions = proportions.dot(&proportions);
        debug!(step, "squared flow proportions");
    }
    for (mut row, row_mass) in proportions.rows_mut().into_iter().zip(mass) {
        row.mapv_inplace(|value| value * row_mass);
    }
    Ok(SparseFlows::from_array(&proportions, min_value_threshold))
}

pub(crate) fn ensure_square<M: FlowMatrix>(flows: &M) -> FlowsResult<()> {
    let (rows, cols) = flows.shape();
    if rows == cols {
        Ok(())
    } else {
        Err(FlowsError::NonSquare { rows, cols })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DenseFlows;
    use nodal_test_support::fixtures::COMMUTER_FLOWS;
    use rstest::rstest;

    fn commuters() -> DenseFlows {
        DenseFlows::from_rows(&COMMUTER_FLOWS).expect("fixture is valid")
    }

    #[rstest]
    #[case("GEOMETRIC_MEAN", DistanceType::GeometricMean)]
    #[case("arithmetic-mean", DistanceType::ArithmeticMean)]
    #[case("Arithmetic", DistanceType::ArithmeticMean)]
    fn distance_type_parses_aliases(#[case] raw: &str, #[case] expected: DistanceType) {
        assert_eq!(raw.parse::<DistanceType>().expect("known name"), expected);
    }

    #[test]
    fn distance_type_rejects_unknown_names() {
        let err = "harmonic".parse::<DistanceType>().expect_err("unknown");
        assert_eq!(err.code().as_str(), "FLOWS_INVALID_DISTANCE_TYPE");
    }

    #[test]
    fn inverse_distances_touch_only_nonzero_entries() {
        let flows = commuters();
        let sizes = flows.row_sums();
        let inverse = build_inverse_distances_matrix(&flows.to_sparse(), &sizes, DistanceType::ArithmeticMean)
            .expect("sizes match");
        assert_eq!(inverse.nnz(), flows.nnz());
        assert!((inverse.get(0, 1) - 20.0 / 65.0).abs() < 1e-12);
        assert_eq!(inverse.get(0, 2), 0.0);
    }

    #[test]
    fn inverse_distances_reject_mismatched_sizes() {
        let err = build_inverse_distances_matrix(&commuters(), &[1.0, 2.0], DistanceType::GeometricMean)
            .expect_err("two sizes for four nodes");
        assert_eq!(err, FlowsError::NodeSizesMismatch { nodes: 4, sizes: 2 });
    }

    #[test]
    fn negative_degree_is_rejected() {
        let err = get_indirect_flows_matrix(&commuters(), -1, 0.1).expect_err("negative degree");
        assert_eq!(err, FlowsError::InvalidDegree { degree: -1 });
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn rectangular_flows_are_rejected_by_indirect_propagation(#[case] degree: i64) {
        let flows = SparseFlows::from_triplets(2, 3, [(0, 1, 4.0), (1, 2, 1.0)])
            .expect("triplets fit the shape");
        let err = get_indirect_flows_matrix(&flows, degree, 0.1).expect_err("2x3 is not square");
        assert_eq!(err, FlowsError::NonSquare { rows: 2, cols: 3 });
    }

    #[test]
    fn first_degree_indirect_flows_match_reference_values() {
        let indirect = get_indirect_flows_matrix(&commuters(), 1, 0.0).expect("degree is valid");
        let expected = [
            [21.190_476, 7.142_857, 3.333_333, 3.333_333],
            [7.142_857, 7.023_81, 5.833_333, 10.0],
            [3.333_333, 5.833_333, 12.5, 18.333_333],
            [3.333_333, 10.0, 18.333_333, 28.333_333],
        ];
        for (row, expected_row) in indirect.to_rows().iter().zip(expected) {
            for (value, expected_value) in row.iter().zip(expected_row) {
                assert!((value - expected_value).abs() < 1e-5, "{value} != {expected_value}");
            }
        }
    }

    #[test]
    fn similarity_of_orthogonal_profiles_is_not_stored() {
        let flows = DenseFlows::from_rows(&[[1.0, 0.0], [0.0, 3.0]])
            .expect("fixture is valid")
            .to_sparse();
        let similarity = build_similarity_matrix(&flows, Norm::L1);
        assert_eq!(similarity.nnz(), 2);
        assert_eq!(similarity.to_rows(), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }
}
