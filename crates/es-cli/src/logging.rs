//! stderr logging for the CLI.
//!
//! Level and format come from `--log-level` / `--log-format` (or `-v` / `-q`),
//! then `ES_LOG` / `ES_LOG_FORMAT`, then `RUST_LOG` directives.
//!
//! stdout is reserved for scrubbed events; all log output goes to stderr.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::io::IsTerminal;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

/// Crates whose events the CLI shows.
const LOG_CRATES: &[&str] = &["es_scrub", "es_config", "es_cli"];

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{other}' (expected human or jsonl)")),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity of the CLI's own crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Contained scrub failures are logged at ERROR, so they show by default.
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = match s.to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "quiet" | "none" => "off".to_string(),
            other => other.to_string(),
        };
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Human output only; JSON lines always carry a timestamp.
    pub timestamps: bool,
    /// Raw `RUST_LOG` directives, used when no level was chosen explicitly.
    pub directives: Option<String>,
}

impl LogConfig {
    /// Combine CLI choices with the process environment.
    ///
    /// Precedence: CLI flags, then `ES_LOG` / `ES_LOG_FORMAT`, then `RUST_LOG`.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_vars(
            cli_level,
            cli_format,
            std::env::var("ES_LOG").ok(),
            std::env::var("ES_LOG_FORMAT").ok(),
            std::env::var("RUST_LOG").ok(),
        )
    }

    fn from_vars(
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
        es_log: Option<String>,
        es_log_format: Option<String>,
        rust_log: Option<String>,
    ) -> Self {
        let mut config = LogConfig {
            timestamps: true,
            ..LogConfig::default()
        };

        let env_level = es_log.and_then(|val| val.parse::<LogLevel>().ok());
        match cli_level.or(env_level) {
            Some(level) => config.level = level,
            None => config.directives = rust_log.filter(|val| !val.trim().is_empty()),
        }

        if let Some(format) = es_log_format.and_then(|val| val.parse::<LogFormat>().ok()) {
            config.format = format;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }

        config
    }

    fn filter(&self) -> EnvFilter {
        if let Some(directives) = &self.directives {
            if let Ok(filter) = EnvFilter::try_new(directives) {
                return filter;
            }
        }
        let directives: Vec<String> = LOG_CRATES
            .iter()
            .map(|name| format!("{}={}", name, self.level))
            .collect();
        EnvFilter::new(directives.join(","))
    }
}

/// Install the global subscriber on stderr.
///
/// Only the first call takes effect.
pub fn init_logging(config: &LogConfig) {
    let human = tfmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal());

    let layer = match config.format {
        LogFormat::Human if config.timestamps => human.boxed(),
        LogFormat::Human => human.without_time().boxed(),
        LogFormat::Jsonl => tfmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .with_span_list(false)
            .boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(config.filter())
        .with(layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_and_format() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("none".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Jsonl));
        assert_eq!(LogLevel::Off.to_string(), "off");
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_cli_overrides_env() {
        let config = LogConfig::from_vars(
            Some(LogLevel::Debug),
            Some(LogFormat::Human),
            Some("error".to_string()),
            Some("jsonl".to_string()),
            Some("trace".to_string()),
        );
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Human);
        assert!(config.directives.is_none());
    }

    #[test]
    fn test_es_log_over_rust_log() {
        let config = LogConfig::from_vars(
            None,
            None,
            Some("error".to_string()),
            Some("json".to_string()),
            Some("trace".to_string()),
        );
        assert_eq!(config.level, LogLevel::Error);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert!(config.directives.is_none());
    }

    #[test]
    fn test_rust_log_kept_as_directives() {
        let config = LogConfig::from_vars(None, None, None, None, Some("es_scrub=trace".into()));
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.directives.as_deref(), Some("es_scrub=trace"));
    }

    #[test]
    fn test_default_filter_covers_workspace_crates() {
        let config = LogConfig::from_vars(Some(LogLevel::Info), None, None, None, None);
        let filter = config.filter().to_string();
        for name in LOG_CRATES {
            assert!(filter.contains(&format!("{name}=info")), "{filter}");
        }
    }
}
