//! Nodal core library.
//!
//! Detects a hierarchy of centers in a weighted flow graph. Each level groups
//! the centers of the level below around their most influential member,
//! producing ever larger catchment areas.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod assignment;
mod detector;
mod error;
mod features;
mod matrix;
mod provider;
mod scoring;
#[cfg(test)]
mod test_utils;

pub use crate::{
    assignment::Assignment,
    detector::{
        CenterDetector, CenterDetectorBuilder, DEFAULT_SIMILARITY_THRESHOLD, DegreePolicy,
        DetectorSettings, aggregate_center_flows, stabilize_assignment,
    },
    error::{DetectorError, DetectorErrorCode, FlowsError, FlowsErrorCode, FlowsResult, Result},
    features::{
        DEFAULT_INDIRECT_FLOW_THRESHOLD, DistanceType, build_inverse_distances_matrix,
        build_similarity_matrix, get_indirect_flows_matrix, get_local_flows_matrix,
    },
    matrix::{DenseFlows, FlowMatrix, Norm, SparseFlows, filter_small_values},
    provider::{FlowTable, FlowTableBuilder, FlowsProvider, UNKNOWN_NODE_NAME},
    scoring::{AssignmentScore, BestLevel, best_scoring_level, score_assignment},
};
