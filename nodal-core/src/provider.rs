//! Boundary between the detector and the sources of flow data.
//!
//! A provider turns raw flow records into a square [`SparseFlows`] matrix and
//! keeps the node codes and names that the core never looks at.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::{
    error::{FlowsError, FlowsResult},
    matrix::{FlowMatrix, SparseFlows},
};

/// Name recorded for nodes whose records never carried one.
pub const UNKNOWN_NODE_NAME: &str = "UNKNOWN";

/// A source of flows between identified nodes.
///
/// # Examples
/// ```
/// use nodal_core::{FlowTableBuilder, FlowsProvider};
///
/// let mut builder = FlowTableBuilder::new("demo");
/// builder.push("B", Some("Bern"), "A", Some("Aarau"), 12.0);
/// builder.push("A", None, "A", None, 3.0);
/// let table = builder.build()?;
///
/// assert_eq!(table.name(), "demo");
/// assert_eq!(table.node_count(), 2);
/// assert_eq!(table.node_index("B"), Some(1));
/// assert_eq!(table.node_name(0), Some("Aarau"));
/// # Ok::<(), nodal_core::FlowsError>(())
/// ```
pub trait FlowsProvider {
    /// Human-readable name of the source.
    fn name(&self) -> &str;

    /// Symmetric flow matrix indexed by node.
    fn flows(&self) -> &SparseFlows;

    /// Number of nodes.
    fn node_count(&self) -> usize {
        self.flows().node_count()
    }

    /// Code of the node at `index`.
    fn node_code(&self, index: usize) -> Option<&str>;

    /// Name of the node at `index`.
    fn node_name(&self, index: usize) -> Option<&str>;

    /// Index of the node identified by `code`.
    fn node_index(&self, code: &str) -> Option<usize>;
}

/// Nodes and symmetric flows assembled from flow records.
#[derive(Clone, Debug)]
pub struct FlowTable {
    name: String,
    codes: Vec<String>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    flows: SparseFlows,
}

impl FlowTable {
    /// Node codes in index order.
    #[must_use]
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Node names in index order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Consumes the table and returns its flow matrix.
    #[must_use]
    pub fn into_flows(self) -> SparseFlows {
        self.flows
    }
}

impl FlowsProvider for FlowTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn flows(&self) -> &SparseFlows {
        &self.flows
    }

    fn node_code(&self, index: usize) -> Option<&str> {
        self.codes.get(index).map(String::as_str)
    }

    fn node_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    fn node_index(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }
}

#[derive(Clone, Debug)]
struct IncomingFlow {
    target: String,
    source: String,
    flow: f64,
}

/// Accumulates incoming flow records and builds a [`FlowTable`].
///
/// Nodes are indexed in ascending code order. The incoming matrix
/// `F[target, source]` is symmetrised as `F + Fᵀ - diag(F)`, so flows in both
/// directions add up and self flows are counted once. The first name seen
/// for a code wins; codes without any name get [`UNKNOWN_NODE_NAME`].
#[derive(Clone, Debug)]
pub struct FlowTableBuilder {
    name: String,
    names: BTreeMap<String, Option<String>>,
    records: Vec<IncomingFlow>,
}

impl FlowTableBuilder {
    /// Creates an empty builder for a source called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            names: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    /// Records `flow` going from `source_code` into `target_code`.
    pub fn push(
        &mut self,
        target_code: &str,
        target_name: Option<&str>,
        source_code: &str,
        source_name: Option<&str>,
        flow: f64,
    ) {
        self.note_name(target_code, target_name);
        self.note_name(source_code, source_name);
        self.records.push(IncomingFlow {
            target: target_code.to_owned(),
            source: source_code.to_owned(),
            flow,
        });
    }

    /// Number of records pushed so far.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn note_name(&mut self, code: &str, name: Option<&str>) {
        let slot = self.names.entry(code.to_owned()).or_insert(None);
        if slot.is_none() {
            *slot = name.filter(|n| !n.is_empty()).map(str::to_owned);
        }
    }

    /// Builds the table.
    ///
    /// # Errors
    /// Returns [`FlowsError::EmptyFlows`] when no record was pushed and
    /// [`FlowsError::NonFiniteFlow`] or [`FlowsError::NegativeFlow`] for an
    /// invalid flow value.
    pub fn build(self) -> FlowsResult<FlowTable> {
        if self.records.is_empty() {
            return Err(FlowsError::EmptyFlows);
        }
        let (codes, names): (Vec<String>, Vec<String>) = self
            .names
            .into_iter()
            .map(|(code, name)| (code, name.unwrap_or_else(|| UNKNOWN_NODE_NAME.to_owned())))
            .unzip();
        let index: HashMap<String, usize> = codes
            .iter()
            .enumerate()
            .map(|(position, code)| (code.clone(), position))
            .collect();

        let nodes = codes.len();
        let mut triplets = Vec::with_capacity(self.records.len() * 2);
        for record in &self.records {
            let (Some(&target), Some(&source)) = (index.get(&record.target), index.get(&record.source))
            else {
                continue;
            };
            triplets.push((target, source, record.flow));
            if target != source {
                triplets.push((source, target, record.flow));
            }
        }
        let flows = SparseFlows::from_triplets(nodes, nodes, triplets)?;
        info!(
            source = %self.name,
            nodes,
            records = self.records.len(),
            nnz = flows.nnz(),
            "flow table built"
        );
        Ok(FlowTable {
            name: self.name,
            codes,
            names,
            index,
            flows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flows_are_symmetrised_with_single_self_flow() {
        let mut builder = FlowTableBuilder::new("test");
        builder.push("a", Some("A"), "b", Some("B"), 4.0);
        builder.push("b", Some("B"), "a", Some("A"), 1.0);
        builder.push("a", Some("A"), "a", Some("A"), 7.0);
        let table = builder.build().expect("records are valid");

        assert_eq!(
            table.flows().to_rows(),
            vec![vec![7.0, 5.0], vec![5.0, 0.0]]
        );
    }

    #[test]
    fn missing_names_become_unknown() {
        let mut builder = FlowTableBuilder::new("test");
        builder.push("z", None, "y", Some(""), 1.0);
        builder.push("x", Some("Ex"), "z", None, 1.0);
        let table = builder.build().expect("records are valid");

        assert_eq!(table.codes(), ["x", "y", "z"]);
        assert_eq!(table.names(), ["Ex", UNKNOWN_NODE_NAME, UNKNOWN_NODE_NAME]);
    }

    #[test]
    fn empty_builder_is_rejected() {
        let err = FlowTableBuilder::new("empty").build().expect_err("no records");
        assert_eq!(err, FlowsError::EmptyFlows);
    }

    #[test]
    fn negative_flows_are_rejected() {
        let mut builder = FlowTableBuilder::new("test");
        builder.push("a", None, "b", None, -2.0);
        let err = builder.build().expect_err("negative flow");
        assert_eq!(err.code().as_str(), "FLOWS_NEGATIVE");
    }
}
