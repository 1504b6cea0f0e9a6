//! Level-by-level center detection.
//!
//! [`CenterDetector`] owns the flow matrix, the node sizes and an append-only
//! cache of [`Assignment`]s, one per hierarchy level. Level 0 is the identity
//! and every later level is derived only from the level before it, so a
//! cached level never changes once computed.

mod builder;
mod stabilize;

use tracing::{Span, debug, field, info, instrument};

pub use self::{
    builder::{CenterDetectorBuilder, DEFAULT_SIMILARITY_THRESHOLD, DegreePolicy, DetectorSettings},
    stabilize::stabilize_assignment,
};
use self::stabilize::select_representatives;
use crate::{
    assignment::Assignment,
    error::{DetectorError, FlowsError, FlowsResult, Result},
    features::{
        DEFAULT_INDIRECT_FLOW_THRESHOLD, build_inverse_distances_matrix, build_similarity_matrix,
        ensure_square, get_indirect_flows_matrix,
    },
    matrix::{FlowMatrix, Norm, SparseFlows, filter_small_values},
};

/// Detects a hierarchy of centers in a flow matrix.
///
/// # Examples
/// ```
/// use nodal_core::{CenterDetector, DenseFlows};
///
/// let flows = DenseFlows::from_rows(&[
///     [25.0, 10.0, 0.0, 0.0],
///     [10.0, 0.0, 10.0, 10.0],
///     [0.0, 10.0, 10.0, 20.0],
///     [0.0, 10.0, 20.0, 30.0],
/// ])?;
/// let mut detector = CenterDetector::new(&flows)?;
/// let levels = detector.get_leveled_assignments(0, 1)?;
/// assert_eq!(levels[0].as_slice(), &[0, 1, 2, 3]);
/// assert_eq!(levels[1].as_slice(), &[0, 3, 3, 3]);
/// # Ok::<(), nodal_core::DetectorError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CenterDetector {
    flows: SparseFlows,
    node_sizes: Vec<f64>,
    levels: Vec<Assignment>,
    settings: DetectorSettings,
}

impl CenterDetector {
    /// Creates a detector with default settings.
    ///
    /// # Errors
    /// See [`CenterDetectorBuilder::build`].
    pub fn new<M: FlowMatrix>(flows: &M) -> Result<Self> {
        CenterDetectorBuilder::new().build(flows)
    }

    /// Creates a detector with default settings whose cache starts with
    /// previously computed `levels`.
    ///
    /// # Errors
    /// See [`CenterDetectorBuilder::build_with_levels`].
    pub fn with_levels<M: FlowMatrix>(flows: &M, levels: Vec<Assignment>) -> Result<Self> {
        CenterDetectorBuilder::new().build_with_levels(flows, levels)
    }

    pub(crate) fn from_settings<M: FlowMatrix>(
        flows: &M,
        settings: DetectorSettings,
        seed: Option<Vec<Assignment>>,
    ) -> Result<Self> {
        ensure_square(flows)?;
        let nodes = flows.node_count();
        if nodes == 0 {
            return Err(DetectorError::EmptyFlows);
        }
        let levels = match seed {
            Some(levels) => validate_seed(levels, nodes)?,
            None => vec![Assignment::identity(nodes)],
        };
        let flows = flows.to_sparse();
        let node_sizes = flows.row_sums();
        Ok(Self {
            flows,
            node_sizes,
            levels,
            settings,
        })
    }

    /// The flow matrix the detector works on.
    #[must_use]
    pub const fn flows(&self) -> &SparseFlows {
        &self.flows
    }

    /// Total flow of every node, i.e. the row sums of the flow matrix.
    #[must_use]
    pub fn node_sizes(&self) -> &[f64] {
        &self.node_sizes
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_sizes.len()
    }

    /// Settings the detector was built with.
    #[must_use]
    pub const fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Number of levels currently cached, level 0 included.
    #[must_use]
    pub fn computed_levels(&self) -> usize {
        self.levels.len()
    }

    /// Cached assignment of `level`, without computing anything.
    #[must_use]
    pub fn assignment(&self, level: usize) -> Option<&Assignment> {
        self.levels.get(level)
    }

    /// Returns levels `min_level..=max_level`, computing missing levels one
    /// at a time. Already cached levels are never recomputed and
    /// `min_level > max_level` yields an empty slice.
    ///
    /// # Errors
    /// Returns [`DetectorError::InvalidLevel`] if either bound is negative and
    /// [`DetectorError::Flows`] if a level computation fails.
    pub fn get_leveled_assignments(
        &mut self,
        min_level: i64,
        max_level: i64,
    ) -> Result<&[Assignment]> {
        let invalid = || DetectorError::InvalidLevel {
            min_level,
            max_level,
        };
        let min = usize::try_from(min_level).map_err(|_| invalid())?;
        let max = usize::try_from(max_level).map_err(|_| invalid())?;
        self.extend_to(max)?;
        Ok(self.levels.get(min..=max).unwrap_or(&[]))
    }

    /// Returns the assignment of `level`, computing it if needed.
    ///
    /// # Errors
    /// See [`CenterDetector::get_leveled_assignments`].
    pub fn get_assignment_of_level(&mut self, level: i64) -> Result<&Assignment> {
        let index = usize::try_from(level).map_err(|_| DetectorError::InvalidLevel {
            min_level: level,
            max_level: level,
        })?;
        self.extend_to(index)?;
        self.levels.get(index).ok_or(DetectorError::LevelNotComputed {
            level: index,
            computed: self.levels.len(),
        })
    }

    /// Iterates the cached levels from `start_level` onwards.
    ///
    /// The iterator never extends the cache; call it again after
    /// [`CenterDetector::get_leveled_assignments`] to see new levels.
    pub fn iterate_computed_assignments(
        &self,
        start_level: usize,
    ) -> impl Iterator<Item = &Assignment> + '_ {
        self.levels.iter().skip(start_level)
    }

    /// Expresses `end_level` relative to the centers of `start_level`.
    ///
    /// The `K` centers present at `start_level`, in ascending index order,
    /// are mapped through `end_level` and renumbered `0..K`. Entry `k` of the
    /// result is the local index of the `end_level` center of the `k`-th
    /// `start_level` center, which is the shape needed to score against the
    /// `K x K` center flows of `start_level`. A `start_level` of zero returns
    /// `end_level` unchanged.
    ///
    /// # Errors
    /// Returns [`DetectorError::LevelNotComputed`] when either level is not
    /// cached.
    pub fn get_inter_levels_assignment(
        &self,
        start_level: usize,
        end_level: usize,
    ) -> Result<Assignment> {
        let end = self.cached(end_level)?;
        if start_level == 0 {
            return Ok(end.clone());
        }
        let start = self.cached(start_level)?;
        let start_centers = start.centers();
        let local = start.compact_indices();
        let relative = start_centers
            .iter()
            .enumerate()
            .map(|(position, &center)| {
                end.center_of(center)
                    .and_then(|super_center| local.get(super_center).copied().flatten())
                    .unwrap_or(position)
            })
            .collect();
        Ok(Assignment::from_vec_unchecked(relative))
    }

    /// Aggregates `flows` by `assignment` and propagates the result to
    /// `degree`.
    ///
    /// # Errors
    /// Propagates the errors of [`aggregate_center_flows`] and
    /// [`get_indirect_flows_matrix`].
    pub fn get_center_flows_of_degree<M: FlowMatrix>(
        flows: &M,
        assignment: &Assignment,
        degree: i64,
    ) -> FlowsResult<SparseFlows> {
        let center_flows = aggregate_center_flows(flows, assignment)?;
        get_indirect_flows_matrix(&center_flows, degree, DEFAULT_INDIRECT_FLOW_THRESHOLD)
    }

    fn cached(&self, level: usize) -> Result<&Assignment> {
        self.levels.get(level).ok_or(DetectorError::LevelNotComputed {
            level,
            computed: self.levels.len(),
        })
    }

    #[instrument(
        name = "core.extend_levels",
        err,
        skip(self),
        fields(nodes = self.node_count(), cached = self.levels.len()),
    )]
    fn extend_to(&mut self, max_level: usize) -> Result<()> {
        while self.levels.len() <= max_level {
            let from = self.levels.len().saturating_sub(1);
            info!(level = from + 1, "computing assignment level");
            let next = self.compute_assignment_of_level(from, from + 1)?;
            self.levels.push(next);
        }
        Ok(())
    }

    /// The per-level clustering step.
    ///
    /// # Panics
    /// Panics if `from_level > to_level`.
    #[instrument(
        name = "core.compute_level",
        err,
        skip(self),
        fields(centers = field::Empty),
    )]
    fn compute_assignment_of_level(
        &self,
        from_level: usize,
        to_level: usize,
    ) -> Result<Assignment> {
        assert!(
            from_level <= to_level,
            "cannot compute level {to_level} from the higher level {from_level}"
        );
        let initial = self.cached(from_level)?;
        let centers = initial.centers();
        Span::current().record("centers", centers.len());

        let sizes_by_node = initial.group_sums(&self.node_sizes)?;
        let center_sizes: Vec<f64> = centers
            .iter()
            .map(|&center| sizes_by_node.get(center).copied().unwrap_or(0.0))
            .collect();

        let center_flows = aggregate_center_flows(&self.flows, initial)?;
        let inverse_distances =
            build_inverse_distances_matrix(&center_flows, &center_sizes, self.settings.distance_type)?;
        let decayed = center_flows.hadamard(&inverse_distances);
        let degree = self.settings.degree_policy.degree(from_level, to_level);
        let indirect =
            get_indirect_flows_matrix(&decayed, degree, self.settings.indirect_flow_threshold)?;
        let mut similarity = build_similarity_matrix(&inverse_distances, Norm::L2);
        filter_small_values(&mut similarity, self.settings.similarity_threshold);
        let potentials = indirect.matmul(&similarity);

        let matches = greedy_match(&potentials);
        let local = initial.compact_indices();
        let raw = initial
            .iter()
            .map(|center| {
                local
                    .get(center)
                    .copied()
                    .flatten()
                    .and_then(|position| matches.get(position))
                    .and_then(|&candidate| centers.get(candidate))
                    .copied()
                    .unwrap_or(center)
            })
            .collect();
        let stable = stabilize_assignment(&Assignment::from_vec_unchecked(raw));
        let next = select_representatives(&stable, &sizes_by_node);
        debug!(centers = next.center_count(), "level computed");
        #[cfg(feature = "metrics")]
        record_level_metrics(to_level, next.center_count());
        Ok(next)
    }
}

#[cfg(feature = "metrics")]
fn record_level_metrics(level: usize, centers: usize) {
    metrics::counter!("nodal_levels_computed").increment(1);
    metrics::gauge!("nodal_level_centers", "level" => level.to_string())
        .set(f64::from(u32::try_from(centers).unwrap_or(u32::MAX)));
}

/// Sums `flows` into a center by center matrix, `M · flows · Mᵀ`, where `M`
/// is [`Assignment::grouping_matrix`]. Rows and columns follow
/// [`Assignment::centers`].
///
/// # Errors
/// Returns [`FlowsError::NonSquare`] for a rectangular matrix and
/// [`FlowsError::AssignmentLengthMismatch`] when the assignment does not
/// cover every node.
pub fn aggregate_center_flows<M: FlowMatrix>(
    flows: &M,
    assignment: &Assignment,
) -> FlowsResult<SparseFlows> {
    ensure_square(flows)?;
    if assignment.len() != flows.node_count() {
        return Err(FlowsError::AssignmentLengthMismatch {
            nodes: flows.node_count(),
            assignment: assignment.len(),
        });
    }
    let grouping = assignment.grouping_matrix();
    Ok(grouping
        .matmul(&flows.to_sparse())
        .matmul(&grouping.transpose()))
}

/// Picks, for every row, the first column holding the row maximum. Rows
/// without a positive value match themselves.
fn greedy_match(potentials: &SparseFlows) -> Vec<usize> {
    let mut best: Vec<Option<(usize, f64)>> = vec![None; potentials.node_count()];
    potentials.for_each_nonzero(|row, col, value| {
        if let Some(slot) = best.get_mut(row) {
            let better = slot.is_none_or(|(best_col, best_value)| {
                value > best_value || (value == best_value && col < best_col)
            });
            if better {
                *slot = Some((col, value));
            }
        }
    });
    best.into_iter()
        .enumerate()
        .map(|(row, pick)| match pick {
            Some((col, value)) if value > 0.0 => col,
            _ => {
                debug!(center = row, "no positive affinity, center keeps itself");
                row
            }
        })
        .collect()
}

fn validate_seed(levels: Vec<Assignment>, nodes: usize) -> Result<Vec<Assignment>> {
    let Some(first) = levels.first() else {
        return Err(DetectorError::InvalidSeedLevels {
            level: 0,
            reason: "at least level 0 is required",
        });
    };
    if first.len() != nodes || !first.is_identity() {
        return Err(DetectorError::InvalidSeedLevels {
            level: 0,
            reason: "level 0 must be the identity",
        });
    }
    if let Some(level) = levels.iter().position(|level| level.len() != nodes) {
        return Err(DetectorError::InvalidSeedLevels {
            level,
            reason: "length differs from the node count",
        });
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DenseFlows;

    use nodal_test_support::fixtures::{GROUPED_ASSIGNMENT, GROUPED_CENTER_FLOWS, GROUPED_FLOWS};

    fn grouped_flows() -> DenseFlows {
        DenseFlows::from_rows(&GROUPED_FLOWS).expect("fixture is valid")
    }

    #[test]
    fn aggregation_sums_blocks() {
        let assignment = Assignment::new(GROUPED_ASSIGNMENT.to_vec()).expect("valid");
        let aggregated = aggregate_center_flows(&grouped_flows(), &assignment).expect("shapes match");
        assert_eq!(aggregated.to_rows(), GROUPED_CENTER_FLOWS.map(Vec::from).to_vec());
    }

    #[test]
    fn greedy_match_breaks_ties_on_lowest_column_and_keeps_isolated_rows() {
        let potentials = SparseFlows::from_triplets(3, 3, [(0, 2, 4.0), (0, 1, 4.0), (1, 0, 1.0)])
            .expect("valid");
        assert_eq!(greedy_match(&potentials), vec![1, 0, 2]);
    }

    #[test]
    fn seed_levels_must_start_with_identity() {
        let err = validate_seed(vec![Assignment::new(vec![1, 1]).expect("valid")], 2)
            .expect_err("level 0 is not the identity");
        assert!(matches!(err, DetectorError::InvalidSeedLevels { level: 0, .. }));
    }

    #[test]
    fn seed_levels_must_cover_every_node() {
        let err = validate_seed(
            vec![Assignment::identity(2), Assignment::identity(3)],
            2,
        )
        .expect_err("level 1 is too long");
        assert!(matches!(err, DetectorError::InvalidSeedLevels { level: 1, .. }));
    }
}
