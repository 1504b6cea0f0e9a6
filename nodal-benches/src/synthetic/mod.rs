//! Seeded flow graphs with planted regions.
//!
//! Nodes are dealt round-robin into regions. The first node of every region
//! is its hub: members commute to their hub, to a couple of neighbours in the
//! same region and, rarely, to an arbitrary node. Hubs keep more internal
//! flow than members. The result is symmetrised like a provider table.

use nodal_core::{FlowsError, SparseFlows};
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};

const HUB_SELF_FLOW: (f64, f64) = (400.0, 800.0);
const MEMBER_SELF_FLOW: (f64, f64) = (50.0, 200.0);
const COMMUTE_FLOW: (f64, f64) = (20.0, 80.0);
const NEIGHBOUR_FLOW: (f64, f64) = (1.0, 10.0);
const BACKGROUND_FLOW: (f64, f64) = (0.1, 2.0);
const NEIGHBOURS_PER_NODE: usize = 2;
const BACKGROUND_PROBABILITY: f64 = 0.05;

/// Errors that may occur during synthetic flow generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum SyntheticError {
    /// The requested node count was zero.
    #[error("node count must be greater than zero")]
    ZeroNodes,
    /// The requested region count was zero.
    #[error("region count must be greater than zero")]
    ZeroRegions,
    /// More regions than nodes were requested.
    #[error("region count ({region_count}) must not exceed node count ({node_count})")]
    RegionCountExceedsNodeCount {
        /// Number of regions requested.
        region_count: usize,
        /// Number of nodes requested.
        node_count: usize,
    },
    /// The generated flows were rejected.
    #[error("generated flows are invalid: {0}")]
    Flows(#[from] FlowsError),
}

/// Configuration of a synthetic flow graph.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticFlowsConfig {
    /// Number of nodes.
    pub node_count: usize,
    /// Number of planted regions.
    pub region_count: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// A generated flow graph and its planted regions.
///
/// # Examples
/// ```
/// use nodal_benches::synthetic::{SyntheticFlows, SyntheticFlowsConfig};
/// use nodal_core::FlowMatrix;
///
/// let config = SyntheticFlowsConfig { node_count: 12, region_count: 3, seed: 7 };
/// let synthetic = SyntheticFlows::generate(&config)?;
/// assert_eq!(synthetic.flows().node_count(), 12);
/// assert_eq!(synthetic.hubs(), vec![0, 1, 2]);
/// # Ok::<(), nodal_benches::synthetic::SyntheticError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SyntheticFlows {
    flows: SparseFlows,
    regions: Vec<usize>,
}

fn sample(rng: &mut SmallRng, (low, high): (f64, f64)) -> f64 {
    rng.gen_range(low..high)
}

fn push_pair(triplets: &mut Vec<(usize, usize, f64)>, a: usize, b: usize, flow: f64) {
    triplets.push((a, b, flow));
    triplets.push((b, a, flow));
}

impl SyntheticFlows {
    /// Generates a flow graph from `config`.
    ///
    /// # Errors
    /// Returns [`SyntheticError::ZeroNodes`], [`SyntheticError::ZeroRegions`]
    /// or [`SyntheticError::RegionCountExceedsNodeCount`] for an invalid
    /// configuration.
    pub fn generate(config: &SyntheticFlowsConfig) -> Result<Self, SyntheticError> {
        if config.node_count == 0 {
            return Err(SyntheticError::ZeroNodes);
        }
        if config.region_count == 0 {
            return Err(SyntheticError::ZeroRegions);
        }
        if config.region_count > config.node_count {
            return Err(SyntheticError::RegionCountExceedsNodeCount {
                region_count: config.region_count,
                node_count: config.node_count,
            });
        }

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); config.region_count];
        let mut regions = Vec::with_capacity(config.node_count);
        for (node, region) in (0..config.node_count).zip((0..config.region_count).cycle()) {
            if let Some(list) = members.get_mut(region) {
                list.push(node);
            }
            regions.push(region);
        }

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let mut triplets = Vec::new();
        for (node, &region) in regions.iter().enumerate() {
            let hub = region;
            let self_flow = if node == hub { HUB_SELF_FLOW } else { MEMBER_SELF_FLOW };
            triplets.push((node, node, sample(&mut rng, self_flow)));
            if node != hub {
                push_pair(&mut triplets, node, hub, sample(&mut rng, COMMUTE_FLOW));
            }
            let same_region = members.get(region).map_or(&[][..], Vec::as_slice);
            let neighbours: Vec<usize> = same_region
                .choose_multiple(&mut rng, NEIGHBOURS_PER_NODE)
                .copied()
                .collect();
            for neighbour in neighbours {
                if neighbour != node {
                    push_pair(&mut triplets, node, neighbour, sample(&mut rng, NEIGHBOUR_FLOW));
                }
            }
            if rng.gen_bool(BACKGROUND_PROBABILITY) {
                let other = rng.gen_range(0..config.node_count);
                if other != node {
                    push_pair(&mut triplets, node, other, sample(&mut rng, BACKGROUND_FLOW));
                }
            }
        }

        let flows = SparseFlows::from_triplets(config.node_count, config.node_count, triplets)?;
        Ok(Self { flows, regions })
    }

    /// The symmetric flow matrix.
    #[must_use]
    pub const fn flows(&self) -> &SparseFlows {
        &self.flows
    }

    /// Planted region of every node.
    #[must_use]
    pub fn regions(&self) -> &[usize] {
        &self.regions
    }

    /// Hub of every region, in region order.
    #[must_use]
    pub fn hubs(&self) -> Vec<usize> {
        let count = self.regions.iter().max().map_or(0, |&last| last + 1);
        (0..count).collect()
    }
}

#[cfg(test)]
mod tests;
