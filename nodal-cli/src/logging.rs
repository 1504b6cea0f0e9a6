//! Structured logging for the `nodal` binary.
//!
//! Diagnostics go to stderr through a global `tracing` subscriber so that
//! summaries on stdout stay machine readable. Records emitted through the
//! `log` facade are forwarded to the same subscriber.

use std::{env, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "NODAL_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "info";

static INSTALLED: OnceLock<LogFormat> = OnceLock::new();

/// Output format of the log records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Plain text intended for terminals.
    #[default]
    Human,
    /// One JSON object per record, including the active span list.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnsupportedFormat {
                provided: other.to_owned(),
            }),
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// `NODAL_LOG_FORMAT` is not valid Unicode.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending variable.
        name: &'static str,
        /// Underlying lookup failure.
        #[source]
        source: env::VarError,
    },
    /// `NODAL_LOG_FORMAT` names an unknown format.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Normalised value supplied by the user.
        provided: String,
    },
}

/// Reads the requested format from the environment.
///
/// # Errors
/// Returns [`LoggingError`] when the variable is not Unicode or names an
/// unknown format.
pub fn format_from_env() -> Result<LogFormat, LoggingError> {
    match env::var(LOG_FORMAT_ENV) {
        Ok(raw) => raw.parse(),
        Err(env::VarError::NotPresent) => Ok(LogFormat::default()),
        Err(source @ env::VarError::NotUnicode(_)) => Err(LoggingError::InvalidUnicode {
            name: LOG_FORMAT_ENV,
            source,
        }),
    }
}

/// Installs the global subscriber once and returns the active format.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Later calls are
/// no-ops. When another subscriber already owns the global slot it is kept
/// and a warning is logged through it.
///
/// # Errors
/// See [`format_from_env`].
pub fn init_logging() -> Result<LogFormat, LoggingError> {
    if let Some(format) = INSTALLED.get() {
        return Ok(*format);
    }
    let format = format_from_env()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let layer = match format {
        LogFormat::Human => layer.boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    };

    let log_bridge = LogTracer::init();
    if let Err(err) = tracing_subscriber::registry().with(filter).with(layer).try_init() {
        tracing::warn!(error = %err, "structured logging already configured elsewhere");
    }
    if let Err(err) = log_bridge {
        tracing::debug!(error = %err, "`log` records keep their existing logger");
    }
    Ok(*INSTALLED.get_or_init(|| format))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("human", LogFormat::Human)]
    #[case("Human", LogFormat::Human)]
    #[case(" JSON\n", LogFormat::Json)]
    fn known_formats_parse(#[case] raw: &str, #[case] expected: LogFormat) {
        assert_eq!(raw.parse::<LogFormat>().expect("known format"), expected);
    }

    #[rstest]
    #[case("xml", "xml")]
    #[case(" Logfmt ", "logfmt")]
    fn unknown_formats_are_rejected(#[case] raw: &str, #[case] provided: &str) {
        let err = raw.parse::<LogFormat>().expect_err("unknown format");
        assert!(
            matches!(&err, LoggingError::UnsupportedFormat { provided: p } if p == provided),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn repeated_initialisation_keeps_the_first_format() {
        let first = init_logging().expect("logging initialises");
        let second = init_logging().expect("second call is a no-op");
        assert_eq!(first, second);
    }
}
