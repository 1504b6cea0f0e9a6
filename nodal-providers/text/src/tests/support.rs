use nodal_test_support::fixtures::COMMUTER_FLOWS;

use crate::TextFlowsSource;

pub(crate) const CODES: [&str; 4] = ["A", "B", "C", "D"];
pub(crate) const NAMES: [&str; 4] = ["Alpha", "Bravo", "Charlie", "Delta"];

/// Incoming flows whose symmetrised matrix is `COMMUTER_FLOWS`.
pub(crate) fn commuter_tsv() -> String {
    let mut text = String::from("target_code\ttarget_name\tsource_code\tsource_name\tflow\n");
    for (i, row) in COMMUTER_FLOWS.iter().enumerate() {
        for (j, &flow) in row.iter().enumerate().skip(i) {
            if flow > 0.0 {
                text.push_str(&format!(
                    "{}\t{}\t{}\t{}\t{flow}\n",
                    CODES[i], NAMES[i], CODES[j], NAMES[j]
                ));
            }
        }
    }
    text
}

pub(crate) fn commuter_source() -> TextFlowsSource {
    TextFlowsSource::from_reader("commuters", commuter_tsv().as_bytes())
        .expect("fixture is a valid flow table")
}
