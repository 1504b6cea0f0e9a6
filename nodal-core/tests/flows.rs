use nodal_core::{
    Assignment, DenseFlows, DistanceType, FlowMatrix, Norm, aggregate_center_flows,
    build_inverse_distances_matrix, build_similarity_matrix, filter_small_values,
    get_indirect_flows_matrix, get_local_flows_matrix,
};
use nodal_test_support::{
    ci::property_test_profile::ProptestRunProfile,
    fixtures::{assert_rows_close, symmetric_flows, symmetric_flows_with_grouping},
};
use proptest::{prelude::*, test_runner::Config};

fn config() -> Config {
    ProptestRunProfile::load(64, false).config()
}

fn dense(rows: &[Vec<f64>]) -> DenseFlows {
    DenseFlows::from_rows(rows).expect("strategy yields square rows")
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn indirect_flows_conserve_row_mass(rows in symmetric_flows(8), degree in 1_i64..4) {
        let flows = dense(&rows);
        let indirect = get_indirect_flows_matrix(&flows, degree, 0.0).expect("degree is valid");
        for (got, expected) in indirect.row_sums().iter().zip(flows.row_sums()) {
            prop_assert!((got - expected).abs() < 1e-6 * expected.max(1.0));
        }
    }

    #[test]
    fn degree_zero_keeps_direct_flows(rows in symmetric_flows(8)) {
        let flows = dense(&rows);
        let indirect = get_indirect_flows_matrix(&flows, 0, 0.5).expect("degree is valid");
        prop_assert_eq!(indirect.to_rows(), flows.to_rows());
    }

    #[test]
    fn sparse_and_dense_features_agree(rows in symmetric_flows(8), arithmetic in any::<bool>()) {
        let flows = dense(&rows);
        let sparse = flows.to_sparse();
        let sizes = flows.row_sums();
        let distance = if arithmetic { DistanceType::ArithmeticMean } else { DistanceType::GeometricMean };

        let dense_inverse = build_inverse_distances_matrix(&flows, &sizes, distance).expect("sizes match");
        let sparse_inverse = build_inverse_distances_matrix(&sparse, &sizes, distance).expect("sizes match");
        assert_rows_close(&sparse_inverse.to_rows(), &dense_inverse.to_rows(), 1e-12);

        let dense_local = get_local_flows_matrix(&flows, &sizes, distance).expect("sizes match");
        let sparse_local = get_local_flows_matrix(&sparse, &sizes, distance).expect("sizes match");
        assert_rows_close(&sparse_local.to_rows(), &dense_local.to_rows(), 1e-9);

        for norm in [Norm::L1, Norm::L2, Norm::Max] {
            let dense_similarity = build_similarity_matrix(&flows, norm);
            let sparse_similarity = build_similarity_matrix(&sparse, norm);
            assert_rows_close(&sparse_similarity.to_rows(), &dense_similarity.to_rows(), 1e-9);
        }
    }

    #[test]
    fn similarity_of_a_profile_with_itself_is_one(rows in symmetric_flows(8)) {
        let similarity = build_similarity_matrix(&dense(&rows).to_sparse(), Norm::L2);
        for node in 0..rows.len() {
            prop_assert!((similarity.get(node, node) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn filtering_is_idempotent(rows in symmetric_flows(8), threshold in 0.0_f64..8.0) {
        let mut once = dense(&rows).to_sparse();
        filter_small_values(&mut once, threshold);
        let mut twice = once.clone();
        filter_small_values(&mut twice, threshold);
        prop_assert_eq!(once.to_rows(), twice.to_rows());
        once.for_each_nonzero(|_, _, value| assert!(value >= threshold));
    }

    #[test]
    fn aggregation_preserves_total_flow(
        (rows, grouping) in symmetric_flows_with_grouping(8),
    ) {
        let flows = dense(&rows);
        let assignment = Assignment::new(grouping).expect("centers are node indices");
        let aggregated = aggregate_center_flows(&flows, &assignment).expect("lengths match");
        prop_assert_eq!(aggregated.node_count(), assignment.center_count());
        prop_assert!((aggregated.total() - flows.total()).abs() < 1e-9);
    }
}
