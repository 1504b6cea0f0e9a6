use nodal_core::{CenterDetector, FlowMatrix, FlowsError};
use rstest::rstest;

use super::{SyntheticError, SyntheticFlows, SyntheticFlowsConfig};

const fn config(node_count: usize, region_count: usize, seed: u64) -> SyntheticFlowsConfig {
    SyntheticFlowsConfig {
        node_count,
        region_count,
        seed,
    }
}

#[rstest]
#[case(config(0, 1, 1), SyntheticError::ZeroNodes)]
#[case(config(5, 0, 1), SyntheticError::ZeroRegions)]
#[case(
    config(3, 4, 1),
    SyntheticError::RegionCountExceedsNodeCount { region_count: 4, node_count: 3 }
)]
fn invalid_configurations_are_rejected(
    #[case] config: SyntheticFlowsConfig,
    #[case] expected: SyntheticError,
) {
    let err = SyntheticFlows::generate(&config).expect_err("invalid configuration");
    assert_eq!(err, expected);
}

#[rstest]
fn rejected_flows_keep_the_offending_value() {
    let err = SyntheticError::from(FlowsError::NegativeFlow {
        row: 1,
        col: 2,
        value: -0.5,
    });
    assert_eq!(
        err,
        SyntheticError::Flows(FlowsError::NegativeFlow {
            row: 1,
            col: 2,
            value: -0.5,
        })
    );
    assert!(err.to_string().starts_with("generated flows are invalid"));
}

#[rstest]
fn generated_flows_are_symmetric() {
    let synthetic = SyntheticFlows::generate(&config(60, 6, 42)).expect("valid configuration");
    let flows = synthetic.flows();
    flows.for_each_nonzero(|row, col, value| {
        assert!((flows.get(col, row) - value).abs() < 1e-9, "asymmetric at ({row}, {col})");
    });
}

#[rstest]
fn generation_is_reproducible() {
    let first = SyntheticFlows::generate(&config(40, 4, 7)).expect("valid configuration");
    let second = SyntheticFlows::generate(&config(40, 4, 7)).expect("valid configuration");
    let other = SyntheticFlows::generate(&config(40, 4, 8)).expect("valid configuration");
    assert_eq!(first.flows().to_rows(), second.flows().to_rows());
    assert_ne!(first.flows().to_rows(), other.flows().to_rows());
}

#[rstest]
fn regions_are_dealt_round_robin() {
    let synthetic = SyntheticFlows::generate(&config(7, 3, 1)).expect("valid configuration");
    assert_eq!(synthetic.regions(), [0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(synthetic.hubs(), vec![0, 1, 2]);
}

#[rstest]
fn members_commute_to_their_hub() {
    let synthetic = SyntheticFlows::generate(&config(30, 3, 11)).expect("valid configuration");
    let flows = synthetic.flows();
    for (node, &hub) in synthetic.regions().iter().enumerate() {
        if node != hub {
            assert!(flows.get(node, hub) >= 20.0, "node {node} lacks a hub flow");
        }
        assert!(flows.get(node, node) >= 50.0);
    }
}

#[rstest]
fn detected_levels_never_gain_centers() {
    let synthetic = SyntheticFlows::generate(&config(80, 8, 3)).expect("valid configuration");
    let mut detector = CenterDetector::new(synthetic.flows()).expect("non-empty flows");
    let counts: Vec<usize> = detector
        .get_leveled_assignments(0, 3)
        .expect("levels compute")
        .iter()
        .map(|level| level.center_count())
        .collect();
    assert_eq!(counts.first(), Some(&80));
    assert!(
        counts.windows(2).all(|pair| matches!(pair, [coarse, finer] if finer <= coarse)),
        "{counts:?}"
    );
}
