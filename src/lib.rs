//! Loads process supervisor configuration files (lists of managed
//! applications, their commands, logs, and restart policies) into
//! validated process descriptors.

#![forbid(unsafe_code, future_incompatible)]
#![deny(
    missing_debug_implementations,
    nonstandard_style,
    // missing_docs,
    unreachable_pub,
    missing_copy_implementations,
    unused_qualifications,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

use std::{fmt, io, path::PathBuf};

pub mod config;
pub mod descriptor;
pub mod loader;
pub mod timestamp;

pub use config::ConfigFormat;
pub use descriptor::{ExecutionMode, ProcessDescriptor, WatchMode};
pub use loader::{load_file, load_str};
pub use timestamp::LogTimestampFormat;

/// Errors produced while loading a configuration. Any error aborts the
/// entire load; no descriptors are returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to read configuration file {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Unsupported configuration file extension for {} (expected `.json` or `.toml`)",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("Malformed {format} configuration")]
    MalformedConfig {
        format: ConfigFormat,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{} is missing required field `{field}`", record_label(.index, .name.as_deref()))]
    MissingField {
        index: usize,
        name: Option<String>,
        field: &'static str,
    },

    #[error("apps[{index}] reuses the name {name:?} already taken by apps[{first_index}]")]
    DuplicateName {
        name: String,
        first_index: usize,
        index: usize,
    },

    #[error("{} has an invalid `{field}`: {reason}", record_label(.index, Some(.name.as_str())))]
    InvalidValue {
        index: usize,
        name: String,
        field: &'static str,
        reason: String,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreadable { .. } => ErrorKind::Unreadable,
            Self::UnsupportedFormat { .. } | Self::MalformedConfig { .. } => {
                ErrorKind::MalformedConfig
            }
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
        }
    }
}

/// Coarse classification of an [`Error`], suitable for reporting.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorKind {
    Unreadable,
    MalformedConfig,
    MissingField,
    DuplicateName,
    InvalidValue,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unreadable => "Unreadable",
            Self::MalformedConfig => "MalformedConfig",
            Self::MissingField => "MissingField",
            Self::DuplicateName => "DuplicateName",
            Self::InvalidValue => "InvalidValue",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn record_label(index: &usize, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("apps[{index}] ({name:?})"),
        None => format!("apps[{index}]"),
    }
}
