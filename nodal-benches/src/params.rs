//! Benchmark parameter types.

use std::fmt;

/// Parameters of a level extension benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct LevelBenchParams {
    /// Number of nodes in the flow graph.
    pub node_count: usize,
    /// Number of planted regions.
    pub region_count: usize,
    /// Highest level computed.
    pub max_level: i64,
}

impl fmt::Display for LevelBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={},regions={},L={}",
            self.node_count, self.region_count, self.max_level
        )
    }
}
