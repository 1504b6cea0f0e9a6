//! Shared test utilities for `nodal-core`.

use nodal_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

/// Proptest configuration honouring `PROGTEST_CASES` and `NODAL_PBT_FORK`.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    ProptestRunProfile::load(default_cases, false).config()
}
