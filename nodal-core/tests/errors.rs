use nodal_core::{DetectorError, DetectorErrorCode, FlowsError, FlowsErrorCode};
use rstest::rstest;

#[rstest]
#[case(
    FlowsError::InvalidDistanceType { provided: "manhattan".to_owned() },
    FlowsErrorCode::InvalidDistanceType,
    "FLOWS_INVALID_DISTANCE_TYPE",
)]
#[case(FlowsError::InvalidNorm { provided: "l3".to_owned() }, FlowsErrorCode::InvalidNorm, "FLOWS_INVALID_NORM")]
#[case(FlowsError::InvalidDegree { degree: -1 }, FlowsErrorCode::InvalidDegree, "FLOWS_INVALID_DEGREE")]
#[case(
    FlowsError::NodeSizesMismatch { nodes: 3, sizes: 2 },
    FlowsErrorCode::NodeSizesMismatch,
    "FLOWS_NODE_SIZES_MISMATCH",
)]
#[case(FlowsError::NonSquare { rows: 2, cols: 3 }, FlowsErrorCode::NonSquare, "FLOWS_NON_SQUARE")]
#[case(
    FlowsError::AssignmentLengthMismatch { nodes: 4, assignment: 3 },
    FlowsErrorCode::AssignmentLengthMismatch,
    "FLOWS_ASSIGNMENT_LENGTH_MISMATCH",
)]
#[case(
    FlowsError::CenterOutOfRange { node: 1, center: 9, nodes: 2 },
    FlowsErrorCode::CenterOutOfRange,
    "FLOWS_CENTER_OUT_OF_RANGE",
)]
#[case(
    FlowsError::IndexOutOfBounds { row: 5, col: 0, rows: 2, cols: 2 },
    FlowsErrorCode::IndexOutOfBounds,
    "FLOWS_INDEX_OUT_OF_BOUNDS",
)]
#[case(FlowsError::EmptyFlows, FlowsErrorCode::EmptyFlows, "FLOWS_EMPTY")]
#[case(FlowsError::NonFiniteFlow { row: 0, col: 1 }, FlowsErrorCode::NonFiniteFlow, "FLOWS_NON_FINITE")]
#[case(
    FlowsError::NegativeFlow { row: 0, col: 1, value: -1.0 },
    FlowsErrorCode::NegativeFlow,
    "FLOWS_NEGATIVE",
)]
fn returns_expected_flows_code(
    #[case] error: FlowsError,
    #[case] expected: FlowsErrorCode,
    #[case] rendered: &str,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), rendered);
    assert_eq!(expected.to_string(), rendered);
}

#[rstest]
#[case(
    DetectorError::InvalidLevel { min_level: -1, max_level: 2 },
    DetectorErrorCode::InvalidLevel,
    None,
)]
#[case(
    DetectorError::LevelNotComputed { level: 4, computed: 2 },
    DetectorErrorCode::LevelNotComputed,
    None,
)]
#[case(DetectorError::EmptyFlows, DetectorErrorCode::EmptyFlows, None)]
#[case(
    DetectorError::InvalidThreshold { parameter: "similarity_threshold", value: -1.0 },
    DetectorErrorCode::InvalidThreshold,
    None,
)]
#[case(
    DetectorError::InvalidSeedLevels { level: 0, reason: "level 0 must be the identity" },
    DetectorErrorCode::InvalidSeedLevels,
    None,
)]
#[case(
    DetectorError::from(FlowsError::InvalidDegree { degree: -2 }),
    DetectorErrorCode::FlowsFailure,
    Some(FlowsErrorCode::InvalidDegree),
)]
fn returns_expected_detector_code(
    #[case] error: DetectorError,
    #[case] expected: DetectorErrorCode,
    #[case] flows_code: Option<FlowsErrorCode>,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), expected.as_str());
    assert_eq!(error.flows_code(), flows_code);
}

#[test]
fn flows_failures_keep_their_source() {
    use std::error::Error as _;

    let error = DetectorError::from(FlowsError::NonSquare { rows: 1, cols: 2 });
    let source = error.source().expect("flows failures carry a source");
    assert_eq!(source.to_string(), "flow matrix must be square (got 1x2)");
}
