use nodal_core::{Assignment, CenterDetector, DenseFlows, score_assignment};
use nodal_test_support::{fixtures::COMMUTER_FLOWS, tracing::RecordingLayer};

#[test]
fn level_computation_is_instrumented() {
    let flows = DenseFlows::from_rows(&COMMUTER_FLOWS).expect("fixture is valid");
    let mut detector = CenterDetector::new(&flows).expect("valid flows");

    let ((), layer) = RecordingLayer::capture(|| {
        detector.get_leveled_assignments(0, 2).expect("levels compute");
    });

    let extend = layer.spans_named("core.extend_levels");
    assert_eq!(extend.len(), 1);
    assert_eq!(extend[0].fields.get("cached").map(String::as_str), Some("1"));
    assert_eq!(extend[0].fields.get("nodes").map(String::as_str), Some("4"));

    let levels = layer.spans_named("core.compute_level");
    let centers: Vec<_> = levels
        .iter()
        .map(|span| span.fields.get("centers").cloned())
        .collect();
    assert_eq!(centers, vec![Some("4".to_owned()), Some("2".to_owned())]);
    assert_eq!(levels[1].fields.get("from_level").map(String::as_str), Some("1"));

    assert!(layer.has_event_field("level", "2"));
}

#[test]
fn cached_levels_open_no_compute_span() {
    let flows = DenseFlows::from_rows(&COMMUTER_FLOWS).expect("fixture is valid");
    let mut detector = CenterDetector::new(&flows).expect("valid flows");
    detector.get_leveled_assignments(0, 1).expect("levels compute");

    let ((), layer) = RecordingLayer::capture(|| {
        detector.get_assignment_of_level(1).expect("cached");
    });
    assert!(layer.spans_named("core.compute_level").is_empty());
}

#[test]
fn scoring_failures_are_recorded_as_errors() {
    let flows = DenseFlows::from_rows(&COMMUTER_FLOWS).expect("fixture is valid");
    let (result, layer) = RecordingLayer::capture(|| score_assignment(&flows, &Assignment::identity(2)));

    assert!(result.is_err());
    assert_eq!(layer.span_names(), ["core.score"]);
    assert!(layer.events().iter().any(|event| event.fields.contains_key("error")));
}
