//! Layered settings: defaults, then a TOML file, then `PROFVIEW_*` variables.
//!
//! ```toml
//! endpoint = "http://apm.internal/apm/profiling/query_graph_profile/"
//! token = "secret"
//! last = "30m"
//!
//! [params]
//! app_name = "shop"
//! service_name = "checkout"
//! data_type = "cpu"
//! ```
//!
//! Command-line flags are applied on top by the binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;

use crate::controller::{ViewMode, DEFAULT_DEBOUNCE};
use crate::data::duration::parse_duration;
use crate::query::{QueryParams, DEFAULT_ENDPOINT};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "profview.toml";

/// Prefix for environment overrides (`PROFVIEW_ENDPOINT`, `PROFVIEW_PARAMS__APP_NAME`).
pub const ENV_PREFIX: &str = "PROFVIEW";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Query parameters sent with every request.
    pub params: BTreeMap<String, Value>,
    /// Look-back window, e.g. "1h".
    pub last: String,
    pub debounce_ms: u64,
    pub mode: ViewMode,
    pub export_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            timeout_secs: 30,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            last: "1h".to_string(),
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            mode: ViewMode::default(),
            export_dir: PathBuf::from("."),
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (required) or the default file (optional),
    /// then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::build(path, None)
    }

    /// Like [`Settings::load`], reading environment overrides from `env`
    /// instead of the process environment.
    pub fn build(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .context("loading configuration")?;

        config
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn query_params(&self) -> QueryParams {
        QueryParams::from(self.params.clone())
    }

    pub fn lookback(&self) -> Result<Duration> {
        parse_duration(&self.last)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
