//! Validated process descriptors handed to the supervisor.

use std::{
    collections::BTreeMap,
    fmt,
    num::NonZeroU32,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use serde::{Serialize, Serializer};

use crate::timestamp::LogTimestampFormat;

/// Process topology the supervisor should use for an app.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Fork,
    Cluster,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Fork
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fork" | "fork_mode" => Ok(Self::Fork),
            "cluster" | "cluster_mode" => Ok(Self::Cluster),
            other => Err(format!(
                "unknown execution mode {other:?} (expected \"fork\" or \"cluster\")"
            )),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fork => f.write_str("fork"),
            Self::Cluster => f.write_str("cluster"),
        }
    }
}

/// Which parts of the filesystem, if any, trigger a restart when
/// changed. Serializes the way it is configured: `false`, `true`, or a
/// list of paths.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WatchMode {
    Disabled,

    /// Watch the whole working directory.
    WorkingDirectory,

    Paths(Vec<PathBuf>),
}

impl Default for WatchMode {
    fn default() -> Self {
        Self::Disabled
    }
}

impl Serialize for WatchMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::WorkingDirectory => serializer.serialize_bool(true),
            Self::Paths(paths) => paths.serialize(serializer),
        }
    }
}

/// How to launch and supervise one app. Every path has already been
/// resolved against the configuration's base directory.
///
/// Serializes with the configuration file's key names, so the output
/// can be handed straight to the supervisor.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct ProcessDescriptor {
    pub name: String,

    /// Program to execute. Bare program names are left unresolved so
    /// that the supervisor can look them up on `PATH`.
    pub command: PathBuf,

    pub args: Vec<String>,

    #[serde(rename = "cwd")]
    pub working_directory: PathBuf,

    #[serde(rename = "instances")]
    pub instance_count: NonZeroU32,

    #[serde(rename = "exec_mode")]
    pub execution_mode: ExecutionMode,

    pub watch: WatchMode,

    #[serde(rename = "env")]
    pub environment: BTreeMap<String, String>,

    #[serde(rename = "out_file", skip_serializing_if = "Option::is_none")]
    pub stdout_log_path: Option<PathBuf>,

    #[serde(rename = "error_file", skip_serializing_if = "Option::is_none")]
    pub stderr_log_path: Option<PathBuf>,

    #[serde(rename = "log_date_format", skip_serializing_if = "Option::is_none")]
    pub log_timestamp_format: Option<LogTimestampFormat>,

    /// Interleave stdout and stderr into one stream.
    pub merge_logs: bool,

    #[serde(rename = "autorestart")]
    pub auto_restart: bool,

    /// Restart ceiling; zero means unlimited.
    pub max_restarts: u32,

    /// Continuous run time after which a restart no longer counts
    /// against `max_restarts`.
    #[serde(serialize_with = "serialize_duration")]
    pub min_uptime: Duration,
}

impl ProcessDescriptor {
    pub fn watch_filesystem(&self) -> bool {
        !matches!(self.watch, WatchMode::Disabled)
    }

    pub fn min_uptime_seconds(&self) -> u64 {
        self.min_uptime.as_secs()
    }

    /// Maximum number of restarts, or `None` if restarts are unlimited.
    pub fn restart_limit(&self) -> Option<u32> {
        (self.max_restarts > 0).then_some(self.max_restarts)
    }

    /// The command and its arguments as a single display line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Writes a duration as `"10s"`, or `"1500ms"` when it has a
/// sub-second part.
fn serialize_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if duration.subsec_nanos() == 0 {
        serializer.collect_str(&format_args!("{}s", duration.as_secs()))
    } else {
        serializer.collect_str(&format_args!("{}ms", duration.as_millis()))
    }
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroU32, path::PathBuf, time::Duration};

    use super::{ExecutionMode, ProcessDescriptor, WatchMode};

    fn descriptor() -> ProcessDescriptor {
        ProcessDescriptor {
            name: String::from("api"),
            command: PathBuf::from("/srv/api/venv/bin/python"),
            args: vec![String::from("-m"), String::from("api")],
            working_directory: PathBuf::from("/srv/api"),
            instance_count: NonZeroU32::new(1).expect("one is non-zero"),
            execution_mode: ExecutionMode::Fork,
            watch: WatchMode::Disabled,
            environment: Default::default(),
            stdout_log_path: None,
            stderr_log_path: None,
            log_timestamp_format: None,
            merge_logs: false,
            auto_restart: true,
            max_restarts: 0,
            min_uptime: Duration::from_millis(10_900),
        }
    }

    #[test]
    fn parses_execution_modes() {
        assert_eq!(Ok(ExecutionMode::Fork), "fork".parse::<ExecutionMode>());
        assert_eq!(Ok(ExecutionMode::Fork), "fork_mode".parse::<ExecutionMode>());
        assert_eq!(Ok(ExecutionMode::Cluster), "cluster".parse::<ExecutionMode>());
        assert_eq!(Ok(ExecutionMode::Cluster), "cluster_mode".parse::<ExecutionMode>());
        assert!("forked".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn zero_max_restarts_is_unlimited() {
        let mut descriptor = descriptor();
        assert_eq!(None, descriptor.restart_limit());

        descriptor.max_restarts = 10;
        assert_eq!(Some(10), descriptor.restart_limit());
    }

    #[test]
    fn min_uptime_seconds_truncates() {
        assert_eq!(10, descriptor().min_uptime_seconds());
    }

    #[test]
    fn watch_filesystem_follows_watch_mode() {
        let mut descriptor = descriptor();
        assert!(!descriptor.watch_filesystem());

        descriptor.watch = WatchMode::Paths(vec![PathBuf::from("/srv/api/src")]);
        assert!(descriptor.watch_filesystem());
    }

    #[test]
    fn serializes_with_config_keys() {
        let mut descriptor = descriptor();
        let json = serde_json::to_value(&descriptor).expect("Failed to serialize");
        assert_eq!("/srv/api", json["cwd"]);
        assert_eq!(1, json["instances"]);
        assert_eq!("fork", json["exec_mode"]);
        assert_eq!(false, json["watch"]);
        assert_eq!(true, json["autorestart"]);
        assert_eq!("10900ms", json["min_uptime"]);
        assert!(json.get("out_file").is_none());

        descriptor.min_uptime = Duration::from_secs(10);
        descriptor.watch = WatchMode::Paths(vec![PathBuf::from("/srv/api/src")]);
        let json = serde_json::to_value(&descriptor).expect("Failed to serialize");
        assert_eq!("10s", json["min_uptime"]);
        assert_eq!(serde_json::json!(["/srv/api/src"]), json["watch"]);

        descriptor.watch = WatchMode::WorkingDirectory;
        let json = serde_json::to_value(&descriptor).expect("Failed to serialize");
        assert_eq!(true, json["watch"]);
    }

    #[test]
    fn joins_command_line() {
        assert_eq!("/srv/api/venv/bin/python -m api", descriptor().command_line());
    }
}
