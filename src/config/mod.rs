//! Configuration documents, exactly as written by users.

use std::{fmt, path::Path};

use serde::Deserialize;

use self::app::AppConfig;
use crate::Error;

pub mod app;
pub mod args;
pub mod uptime;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub apps: Vec<AppConfig>,
}

impl Config {
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, Error> {
        let parsed: Result<Self, Box<dyn std::error::Error + Send + Sync>> = match format {
            ConfigFormat::Json => serde_json::from_str(text).map_err(|err| Box::new(err) as _),
            ConfigFormat::Toml => toml::from_str(text).map_err(|err| Box::new(err) as _),
        };

        parsed.map_err(|source| Error::MalformedConfig { format, source })
    }
}

/// Structured-data syntax of a configuration document.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension, if it is one we know.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Toml => f.write_str("TOML"),
        }
    }
}
