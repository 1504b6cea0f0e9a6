//! Quality score of a node to center assignment.
//!
//! A node is well represented when its own flow profile resembles the
//! aggregate profile of its center. The score weighs that cosine similarity by
//! the share of the node's flows that stay inside its center, summed over all
//! nodes and divided by the total flow mass. Two baselines bracket it: every
//! node alone and every node in a single center.

use std::fmt;

use tracing::{debug, instrument};

use crate::{
    assignment::Assignment,
    detector::CenterDetector,
    error::{FlowsError, FlowsResult, Result},
    features::ensure_square,
    matrix::{FlowMatrix, Norm, safe_ratio},
};

/// Score of an assignment with its two reference baselines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssignmentScore {
    /// Score of the assignment being evaluated.
    pub proposed: f64,
    /// Score obtained when every node shares one center.
    pub all_together: f64,
    /// Score obtained when every node is its own center.
    pub all_alone: f64,
}

impl fmt::Display for AssignmentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4}% (one center score: {:.4}%, all nodes alone score: {:.4}%)",
            self.proposed * 100.0,
            self.all_together * 100.0,
            self.all_alone * 100.0,
        )
    }
}

/// Scores `assignment` against `flows`.
///
/// The computation is `O(nnz)` and never materialises the node to node
/// same-center indicator. A matrix without any flow scores zero everywhere.
///
/// # Errors
/// Returns [`FlowsError::EmptyFlows`] for a matrix without nodes,
/// [`FlowsError::NonSquare`] for a rectangular matrix and
/// [`FlowsError::AssignmentLengthMismatch`] when the assignment does not
/// cover every node.
///
/// # Examples
/// ```
/// use nodal_core::{Assignment, DenseFlows, score_assignment};
///
/// let flows = DenseFlows::from_rows(&[[2.0, 1.0], [1.0, 2.0]])?;
/// let alone = score_assignment(&flows, &Assignment::identity(2))?;
/// assert!((alone.proposed - alone.all_alone).abs() < 1e-12);
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[instrument(
    name = "core.score",
    level = "debug",
    err,
    skip(flows, assignment),
    fields(nodes = flows.node_count(), centers = assignment.center_count()),
)]
pub fn score_assignment<M: FlowMatrix>(
    flows: &M,
    assignment: &Assignment,
) -> FlowsResult<AssignmentScore> {
    ensure_square(flows)?;
    let nodes = flows.node_count();
    if nodes == 0 {
        return Err(FlowsError::EmptyFlows);
    }
    if assignment.len() != nodes {
        return Err(FlowsError::AssignmentLengthMismatch {
            nodes,
            assignment: assignment.len(),
        });
    }

    let full_mass = flows.total();
    let row_norms = flows.row_norms(Norm::L2);
    let score = AssignmentScore {
        proposed: safe_ratio(proposed_mass(flows, assignment, &row_norms), full_mass),
        all_together: safe_ratio(merged_mass(flows, &row_norms), full_mass),
        all_alone: safe_ratio(lone_mass(flows, &row_norms), full_mass),
    };
    debug!(proposed = score.proposed, "assignment scored");
    Ok(score)
}

fn lone_mass<M: FlowMatrix>(flows: &M, row_norms: &[f64]) -> f64 {
    flows
        .diagonal()
        .iter()
        .zip(row_norms)
        .map(|(&self_flow, &norm)| safe_ratio(self_flow, norm) * self_flow)
        .sum()
}

fn merged_mass<M: FlowMatrix>(flows: &M, row_norms: &[f64]) -> f64 {
    let column_sums = flows.column_sums();
    let column_norm = column_sums.iter().map(|v| v * v).sum::<f64>().sqrt();
    let mut dots = vec![0.0; flows.node_count()];
    flows.for_each_nonzero(|row, col, value| {
        if let (Some(dot), Some(column)) = (dots.get_mut(row), column_sums.get(col)) {
            *dot += value * column;
        }
    });
    let row_sums = flows.row_sums();
    dots.iter()
        .zip(row_norms)
        .zip(&row_sums)
        .map(|((&dot, &norm), &mass)| safe_ratio(dot, norm * column_norm) * mass)
        .sum()
}

fn proposed_mass<M: FlowMatrix>(flows: &M, assignment: &Assignment, row_norms: &[f64]) -> f64 {
    let nodes = flows.node_count();
    let same_center =
        |a: usize, b: usize| assignment.center_of(a).is_some() && assignment.center_of(a) == assignment.center_of(b);

    // Column profile of each node's center restricted to the center's members.
    let mut center_profile = vec![0.0; nodes];
    flows.for_each_nonzero(|row, col, value| {
        if same_center(row, col) {
            if let Some(slot) = center_profile.get_mut(col) {
                *slot += value;
            }
        }
    });
    let mut profile_norms = vec![0.0; nodes];
    for (node, value) in center_profile.iter().enumerate() {
        if let Some(slot) = assignment.center_of(node).and_then(|c| profile_norms.get_mut(c)) {
            *slot += value * value;
        }
    }

    let mut dots = vec![0.0; nodes];
    let mut inner_mass = vec![0.0; nodes];
    flows.for_each_nonzero(|row, col, value| {
        if same_center(row, col) {
            if let (Some(dot), Some(mass)) = (dots.get_mut(row), inner_mass.get_mut(row)) {
                *dot += value * center_profile.get(col).copied().unwrap_or(0.0);
                *mass += value;
            }
        }
    });

    (0..nodes)
        .map(|node| {
            let profile_norm = assignment
                .center_of(node)
                .and_then(|c| profile_norms.get(c))
                .map_or(0.0, |squared| squared.sqrt());
            let norm = row_norms.get(node).copied().unwrap_or(0.0);
            let dot = dots.get(node).copied().unwrap_or(0.0);
            let mass = inner_mass.get(node).copied().unwrap_or(0.0);
            safe_ratio(dot, norm * profile_norm) * mass
        })
        .sum()
}

/// Level selected by [`best_scoring_level`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestLevel {
    /// Index of the selected level.
    pub level: usize,
    /// Score of that level.
    pub score: AssignmentScore,
}

/// Walks the computed levels from `start_level` upwards and returns the last
/// level before the score first decreases.
///
/// Each level is scored through
/// [`CenterDetector::get_inter_levels_assignment`], so `flows` must be indexed
/// by the centers of `start_level`: the original flows when `start_level` is
/// zero, the output of [`CenterDetector::get_center_flows_of_degree`] for that
/// level otherwise. Returns `None` when `start_level` has not been computed.
///
/// # Errors
/// Propagates scoring failures, typically a `flows` matrix whose dimension
/// does not match the number of centers at `start_level`.
pub fn best_scoring_level<M: FlowMatrix>(
    detector: &CenterDetector,
    flows: &M,
    start_level: usize,
) -> Result<Option<BestLevel>> {
    let mut best: Option<BestLevel> = None;
    for level in start_level..detector.computed_levels() {
        let relative = detector.get_inter_levels_assignment(start_level, level)?;
        let score = score_assignment(flows, &relative)?;
        if let Some(previous) = best {
            if previous.score.proposed > score.proposed {
                break;
            }
        }
        best = Some(BestLevel { level, score });
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DenseFlows, SparseFlows,
        test_utils::suite_proptest_config,
    };
    use nodal_test_support::fixtures::{COMMUTER_FLOWS, symmetric_flows_with_grouping};
    use proptest::prelude::*;

    fn commuters() -> DenseFlows {
        DenseFlows::from_rows(&COMMUTER_FLOWS).expect("fixture is valid")
    }

    #[test]
    fn identity_matches_all_alone_baseline() {
        let score = score_assignment(&commuters(), &Assignment::identity(4)).expect("valid input");
        assert!((score.proposed - 0.311_199_466_356_898_8).abs() < 1e-12);
        assert!((score.proposed - score.all_alone).abs() < 1e-12);
    }

    #[test]
    fn single_center_matches_all_together_baseline() {
        let assignment = Assignment::new(vec![2; 4]).expect("valid");
        let score = score_assignment(&commuters().to_sparse(), &assignment).expect("valid input");
        assert!((score.all_together - 0.822_749_708_677_276_9).abs() < 1e-12);
        assert!((score.proposed - score.all_together).abs() < 1e-12);
    }

    #[test]
    fn grouped_assignment_beats_both_baselines() {
        let assignment = Assignment::new(vec![0, 3, 3, 3]).expect("valid");
        let score = score_assignment(&commuters(), &assignment).expect("valid input");
        assert!((score.proposed - 0.835_887_712_186_783_6).abs() < 1e-12);
        assert!(score.proposed > score.all_together);
    }

    #[test]
    fn mismatched_assignment_is_rejected() {
        let err = score_assignment(&commuters(), &Assignment::identity(3)).expect_err("3 != 4");
        assert_eq!(
            err,
            FlowsError::AssignmentLengthMismatch {
                nodes: 4,
                assignment: 3
            }
        );
    }

    #[test]
    fn flowless_matrix_scores_zero() {
        let flows = SparseFlows::zeros(3, 3);
        let score = score_assignment(&flows, &Assignment::identity(3)).expect("valid input");
        assert_eq!(score, AssignmentScore { proposed: 0.0, all_together: 0.0, all_alone: 0.0 });
    }

    #[test]
    fn display_reports_percentages() {
        let score = AssignmentScore {
            proposed: 0.835_887_712_186_783_6,
            all_together: 0.822_749_708_677_276_9,
            all_alone: 0.311_199_466_356_898_8,
        };
        assert_eq!(
            score.to_string(),
            "83.5888% (one center score: 82.2750%, all nodes alone score: 31.1199%)"
        );
    }

    proptest! {
        #![proptest_config(suite_proptest_config(128))]

        #[test]
        fn scores_are_fractions_and_baselines_agree(
            (rows, grouping) in symmetric_flows_with_grouping(8),
        ) {
            let flows = DenseFlows::from_rows(&rows).expect("strategy yields square rows");
            let nodes = rows.len();
            let assignment = Assignment::new(grouping).expect("centers are node indices");

            let score = score_assignment(&flows, &assignment).expect("valid input");
            for value in [score.proposed, score.all_together, score.all_alone] {
                prop_assert!((-1e-12..=1.0 + 1e-12).contains(&value));
            }

            let alone = score_assignment(&flows, &Assignment::identity(nodes)).expect("valid input");
            prop_assert!((alone.proposed - alone.all_alone).abs() < 1e-9);
            let together = score_assignment(&flows.to_sparse(), &Assignment::new(vec![0; nodes]).expect("valid"))
                .expect("valid input");
            prop_assert!((together.proposed - together.all_together).abs() < 1e-9);
        }
    }
}
