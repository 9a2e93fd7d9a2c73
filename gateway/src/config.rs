//! Configuration for the filter module
//!
//! Loaded from environment variables with sensible defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `EDGEFILTER_MODULE_ID` | `FilterModule` |
//! | `EDGEFILTER_INPUT` | `input1` |
//! | `EDGEFILTER_OUTPUT` | `output1` |
//! | `EDGEFILTER_HEARTBEAT_OUTPUT` | `heartbeat` |
//! | `EDGEFILTER_TEMPERATURE_THRESHOLD` | `25` |
//! | `EDGEFILTER_POLL_INTERVAL_MS` | `100` |
//! | `EDGEFILTER_LOG_LEVEL` | `info` |
//! | `EDGEFILTER_LOG_FORMAT` | `pretty` |
//! | `EDGEFILTER_METRICS_ADDR` | `0.0.0.0:9090` (`off` disables) |

use crate::error::{FilterError, Result};
use crate::threshold::DEFAULT_TEMPERATURE_THRESHOLD;
use std::net::SocketAddr;
use std::str::FromStr;

const PREFIX: &str = "EDGEFILTER_";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(FilterError::Config(format!("unknown log format: {other}"))),
        }
    }
}

/// Module configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Name used in the heartbeat message
    pub module_id: String,
    /// Input carrying telemetry
    pub input: String,
    /// Output receiving alerts
    pub output: String,
    /// Output receiving heartbeat messages
    pub heartbeat_output: String,
    /// Threshold until a twin update changes it
    pub temperature_threshold: i64,
    /// Transport pump interval
    pub poll_interval_ms: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Log format
    pub log_format: LogFormat,
    /// Metrics listen address; `None` disables the server
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_id: "FilterModule".to_string(),
            input: "input1".to_string(),
            output: "output1".to_string(),
            heartbeat_output: "heartbeat".to_string(),
            temperature_threshold: DEFAULT_TEMPERATURE_THRESHOLD,
            poll_interval_ms: 100,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_addr: Some(SocketAddr::from(([0, 0, 0, 0], 9090))),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` (full variable name in, value out)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{PREFIX}{name}"));
        let defaults = Self::default();

        let config = Self {
            module_id: non_empty(var("MODULE_ID"), "MODULE_ID")?.unwrap_or(defaults.module_id),
            input: non_empty(var("INPUT"), "INPUT")?.unwrap_or(defaults.input),
            output: non_empty(var("OUTPUT"), "OUTPUT")?.unwrap_or(defaults.output),
            heartbeat_output: non_empty(var("HEARTBEAT_OUTPUT"), "HEARTBEAT_OUTPUT")?
                .unwrap_or(defaults.heartbeat_output),
            temperature_threshold: parse(var("TEMPERATURE_THRESHOLD"), "TEMPERATURE_THRESHOLD")?
                .unwrap_or(defaults.temperature_threshold),
            poll_interval_ms: parse(var("POLL_INTERVAL_MS"), "POLL_INTERVAL_MS")?
                .unwrap_or(defaults.poll_interval_ms),
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse(var("LOG_FORMAT"), "LOG_FORMAT")?.unwrap_or(defaults.log_format),
            metrics_addr: match var("METRICS_ADDR") {
                None => defaults.metrics_addr,
                Some(value) if value.eq_ignore_ascii_case("off") => None,
                Some(value) => Some(value.parse().map_err(|e| {
                    FilterError::Config(format!("{PREFIX}METRICS_ADDR: {value:?}: {e}"))
                })?),
            },
        };

        if config.poll_interval_ms == 0 {
            return Err(FilterError::Config(format!(
                "{PREFIX}POLL_INTERVAL_MS must be greater than zero"
            )));
        }

        Ok(config)
    }
}

fn parse<T>(value: Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| FilterError::Config(format!("{PREFIX}{name}: {raw:?}: {e}")))
        })
        .transpose()
}

fn non_empty(value: Option<String>, name: &str) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(FilterError::Config(format!(
            "{PREFIX}{name} must not be empty"
        ))),
        other => Ok(other),
    }
}
