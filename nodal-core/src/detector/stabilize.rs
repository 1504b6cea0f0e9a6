//! Turns a raw greedy match into a partition.
//!
//! The raw match is a function graph: every node points at one node, possibly
//! itself, and may form chains and cycles. Each weakly connected component of
//! that graph becomes one group.

use std::collections::VecDeque;

use crate::assignment::Assignment;

/// Collapses every weakly connected component of `raw` onto its lowest node
/// index.
///
/// The result is a valid partition and is its own fixed point:
/// `stabilize_assignment(&stabilize_assignment(x)) == stabilize_assignment(x)`.
///
/// # Examples
/// ```
/// use nodal_core::{Assignment, stabilize_assignment};
///
/// // 0 -> 3 -> 2 -> 0 is a cycle and 1 -> 3 hangs off it.
/// let raw = Assignment::new(vec![3, 3, 0, 2])?;
/// assert_eq!(stabilize_assignment(&raw).as_slice(), &[0, 0, 0, 0]);
///
/// let split = Assignment::new(vec![3, 3, 0, 2, 4])?;
/// assert_eq!(stabilize_assignment(&split).as_slice(), &[0, 0, 0, 0, 4]);
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
#[must_use]
pub fn stabilize_assignment(raw: &Assignment) -> Assignment {
    let nodes = raw.len();
    let mut pointed_by: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    for (node, target) in raw.iter().enumerate() {
        if let Some(sources) = pointed_by.get_mut(target) {
            sources.push(node);
        }
    }

    let mut group: Vec<Option<usize>> = vec![None; nodes];
    let mut frontier = VecDeque::new();
    for seed in 0..nodes {
        if group.get(seed).copied().flatten().is_some() {
            continue;
        }
        mark(&mut group, &mut frontier, seed, seed);
        while let Some(node) = frontier.pop_front() {
            if let Some(target) = raw.center_of(node) {
                mark(&mut group, &mut frontier, target, seed);
            }
            for &source in pointed_by.get(node).map_or(&[][..], Vec::as_slice) {
                mark(&mut group, &mut frontier, source, seed);
            }
        }
    }

    Assignment::from_vec_unchecked(
        group
            .into_iter()
            .enumerate()
            .map(|(node, id)| id.unwrap_or(node))
            .collect(),
    )
}

fn mark(group: &mut [Option<usize>], frontier: &mut VecDeque<usize>, node: usize, id: usize) {
    if let Some(slot) = group.get_mut(node) {
        if slot.is_none() {
            *slot = Some(id);
            frontier.push_back(node);
        }
    }
}

/// Re-points every member of a stable group to the member with the largest
/// `sizes` entry.
///
/// Members are scanned in ascending index order and only a strictly larger
/// size replaces the current pick, so ties go to the lowest index.
pub(crate) fn select_representatives(stable: &Assignment, sizes: &[f64]) -> Assignment {
    let mut largest: Vec<Option<(usize, f64)>> = vec![None; stable.len()];
    for (node, group) in stable.iter().enumerate() {
        let size = sizes.get(node).copied().unwrap_or(0.0);
        if let Some(slot) = largest.get_mut(group) {
            if slot.is_none_or(|(_, best)| size > best) {
                *slot = Some((node, size));
            }
        }
    }
    Assignment::from_vec_unchecked(
        stable
            .iter()
            .enumerate()
            .map(|(node, group)| {
                largest
                    .get(group)
                    .copied()
                    .flatten()
                    .map_or(node, |(representative, _)| representative)
            })
            .collect(),
    )
}
