//! Property-test run profile read from the environment.
//!
//! Every property suite in the workspace sizes itself through this module so
//! CI can raise case counts, or isolate cases in subprocesses, with one
//! environment change.

use std::env;

use proptest::test_runner::Config;

/// Environment variable overriding the number of cases per property.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable enabling forked proptest execution.
pub const NODAL_PBT_FORK_ENV_KEY: &str = "NODAL_PBT_FORK";

/// Case count and fork mode for a property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads overrides from the environment, falling back to the defaults.
    ///
    /// Malformed overrides are logged and ignored.
    ///
    /// # Examples
    /// ```
    /// use nodal_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_from_env(PROGTEST_CASES_ENV_KEY, parse_cases).unwrap_or(default_cases),
            fork: override_from_env(NODAL_PBT_FORK_ENV_KEY, parse_switch).unwrap_or(default_fork),
        }
    }

    /// Cases to run per property.
    #[must_use]
    pub const fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether cases run in forked subprocesses.
    #[must_use]
    pub const fn fork(&self) -> bool {
        self.fork
    }

    /// Proptest configuration carrying this profile.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            cases: self.cases,
            fork: self.fork,
            ..Config::default()
        }
    }
}

fn override_from_env<T>(key: &'static str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(key).ok()?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        tracing::warn!(env = key, raw = %raw, "ignoring malformed property-test override");
    }
    parsed
}

fn parse_cases(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|cases| *cases > 0)
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(1))]
    #[case(" 250 ", Some(250))]
    #[case("0", None)]
    #[case("-3", None)]
    #[case("many", None)]
    fn case_overrides_must_be_positive_integers(#[case] raw: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_cases(raw), expected);
    }

    #[rstest]
    #[case("TRUE", Some(true))]
    #[case("on", Some(true))]
    #[case("0", Some(false))]
    #[case("no", Some(false))]
    #[case("", None)]
    #[case("2", None)]
    fn fork_overrides_accept_common_switch_spellings(
        #[case] raw: &str,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(parse_switch(raw), expected);
    }

    #[test]
    fn config_carries_profile_values() {
        let profile = ProptestRunProfile {
            cases: 17,
            fork: true,
        };
        let config = profile.config();
        assert_eq!(config.cases, 17);
        assert!(config.fork);
    }
}
