//! App configuration.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{args::ArgsConfig, uptime::UptimeConfig};

/// One entry of the `apps` collection. Every field is optional here so
/// that missing or out-of-range values can be reported precisely when
/// the record is turned into a [`crate::ProcessDescriptor`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, alias = "script")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: ArgsConfig,

    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub instances: Option<i64>,

    #[serde(default)]
    pub exec_mode: Option<String>,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub env: BTreeMap<String, EnvValue>,

    #[serde(default, alias = "output", alias = "out")]
    pub out_file: Option<String>,

    #[serde(default, alias = "error", alias = "err", alias = "err_file")]
    pub error_file: Option<String>,

    #[serde(default)]
    pub log_date_format: Option<String>,

    #[serde(default)]
    pub merge_logs: Option<bool>,

    #[serde(default)]
    pub autorestart: Option<bool>,

    #[serde(default)]
    pub max_restarts: Option<i64>,

    #[serde(default)]
    pub min_uptime: Option<UptimeConfig>,
}

/// `watch = true` watches the working directory; a list names the
/// paths to watch instead.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(untagged)]
pub enum WatchConfig {
    Toggle(bool),

    Paths(Vec<String>),
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::Toggle(false)
    }
}

/// Environment variable value. Non-string scalars are accepted and
/// passed to the process in their textual form.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Text(String),

    Integer(i64),

    Float(f64),

    Flag(bool),
}

impl EnvValue {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Flag(value) => value.to_string(),
        }
    }
}
