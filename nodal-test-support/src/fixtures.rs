//! Flow matrices and matrix strategies shared by the test suites.

use proptest::{collection, prelude::*};

/// Four municipalities exchanging commuters. Node 0 is mostly self-contained
/// while nodes 1 to 3 form one commuting basin around node 3.
pub const COMMUTER_FLOWS: [[f64; 4]; 4] = [
    [25.0, 10.0, 0.0, 0.0],
    [10.0, 0.0, 10.0, 10.0],
    [0.0, 10.0, 10.0, 20.0],
    [0.0, 10.0, 20.0, 30.0],
];

/// Row sums of [`COMMUTER_FLOWS`].
pub const COMMUTER_SIZES: [f64; 4] = [35.0, 30.0, 40.0, 60.0];

/// Seven nodes in four blocks: `{0, 2}`, `{1, 4, 5}`, `{3}` and `{6}`.
pub const GROUPED_FLOWS: [[f64; 7]; 7] = [
    [20.0, 0.0, 10.0, 1.0, 2.0, 1.0, 0.0],
    [0.0, 5.0, 0.0, 3.0, 10.0, 10.0, 0.0],
    [10.0, 0.0, 7.0, 0.0, 0.0, 0.0, 0.0],
    [1.0, 3.0, 0.0, 10.0, 0.0, 0.0, 0.0],
    [2.0, 10.0, 0.0, 0.0, 5.0, 12.0, 0.0],
    [1.0, 10.0, 0.0, 0.0, 12.0, 5.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 27.0],
];

/// Block assignment of [`GROUPED_FLOWS`].
pub const GROUPED_ASSIGNMENT: [usize; 7] = [0, 1, 0, 3, 1, 1, 6];

/// [`GROUPED_FLOWS`] summed per block of [`GROUPED_ASSIGNMENT`].
pub const GROUPED_CENTER_FLOWS: [[f64; 4]; 4] = [
    [47.0, 3.0, 1.0, 0.0],
    [3.0, 79.0, 3.0, 0.0],
    [1.0, 3.0, 10.0, 0.0],
    [0.0, 0.0, 0.0, 27.0],
];

/// Asserts that two matrices agree entry by entry within `tolerance`.
///
/// # Panics
/// Panics on a shape mismatch or on the first entry outside the tolerance.
pub fn assert_rows_close<R: AsRef<[f64]>>(actual: &[Vec<f64>], expected: &[R], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "row count differs");
    for (row, (actual_row, expected_row)) in actual.iter().zip(expected).enumerate() {
        let expected_row = expected_row.as_ref();
        assert_eq!(actual_row.len(), expected_row.len(), "row {row} length differs");
        for (col, (a, e)) in actual_row.iter().zip(expected_row).enumerate() {
            assert!(
                (a - e).abs() <= tolerance,
                "entry ({row}, {col}) is {a}, expected {e}"
            );
        }
    }
}

/// Square symmetric non-negative matrices of `2..=max_nodes` nodes with small
/// integral flows. Many off-diagonal entries are zero; the diagonal is always
/// positive so no row is empty.
pub fn symmetric_flows(max_nodes: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    (2..=max_nodes.max(2)).prop_flat_map(|nodes| {
        collection::vec(0_u8..12, nodes * nodes)
            .prop_map(move |cells| symmetric_from_cells(nodes, &cells))
    })
}

/// [`symmetric_flows`] paired with a grouping whose centers are valid node
/// indices of the generated matrix.
pub fn symmetric_flows_with_grouping(
    max_nodes: usize,
) -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<usize>)> {
    symmetric_flows(max_nodes).prop_flat_map(|rows| {
        let nodes = rows.len();
        (Just(rows), collection::vec(0..nodes, nodes))
    })
}

fn symmetric_from_cells(nodes: usize, cells: &[u8]) -> Vec<Vec<f64>> {
    let cell = |i: usize, j: usize| cells.get(i * nodes + j).copied().unwrap_or_default();
    let mut rows = vec![vec![0.0; nodes]; nodes];
    for i in 0..nodes {
        for j in 0..i {
            let value = f64::from(cell(i, j).saturating_sub(4));
            rows[i][j] = value;
            rows[j][i] = value;
        }
        rows[i][i] = f64::from(cell(i, i)) + 1.0;
    }
    rows
}
