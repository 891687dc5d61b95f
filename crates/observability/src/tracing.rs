//! Tracing/logging initialization.
//!
//! Filtering follows `RUST_LOG`; the output format follows `SPLITLEDGER_LOG_FORMAT`
//! (`json`, the default, or `pretty`).

use core::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const FORMAT_ENV: &str = "SPLITLEDGER_LOG_FORMAT";
pub const FILTER_ENV: &str = "RUST_LOG";
pub const DEFAULT_FILTER: &str = "info";

/// Log line format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `info,splitledger_settlement=debug`.
    pub filter: String,
    pub format: LogFormat,
    /// Unrecognised `SPLITLEDGER_LOG_FORMAT` value, reported once logging is up.
    ignored_format: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            ignored_format: None,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unknown formats keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = lookup(FILTER_ENV).filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(raw) = lookup(FORMAT_ENV) {
            match raw.parse() {
                Ok(format) => config.format = format,
                Err(_) => config.ignored_format = Some(raw),
            }
        }
        config
    }

    pub fn ignored_format(&self) -> Option<&str> {
        self.ignored_format.as_deref()
    }
}

/// Initialize tracing/logging for the process.
///
/// Returns `false` when a global subscriber was already installed.
/// Configuration problems are logged through the new subscriber once it is installed.
pub fn init_with(config: &LogConfig) -> bool {
    let (filter, filter_rejected) = match EnvFilter::try_new(&config.filter) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new(DEFAULT_FILTER), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let installed = match config.format {
        LogFormat::Json => builder.json().with_target(false).try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
    };

    if installed {
        if let Some(raw) = config.ignored_format() {
            ::tracing::warn!(var = FORMAT_ENV, value = raw, "unknown log format; using json");
        }
        if filter_rejected {
            ::tracing::warn!(filter = %config.filter, fallback = DEFAULT_FILTER, "invalid log filter; using default");
        }
    }
    installed
}
