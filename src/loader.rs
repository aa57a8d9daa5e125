//! Turns configuration documents into validated process descriptors.

use std::{
    collections::{BTreeMap, HashMap},
    env, fs,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use path_clean::PathClean;

use crate::{
    config::{
        app::{AppConfig, WatchConfig},
        Config, ConfigFormat,
    },
    descriptor::{ExecutionMode, ProcessDescriptor, WatchMode},
    timestamp::LogTimestampFormat,
    Error,
};

/// Reads and validates the configuration file at `path`. The format is
/// picked from the file extension, and relative paths inside the file
/// are resolved against the directory that contains it.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<ProcessDescriptor>, Error> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
        path: path.to_owned(),
    })?;

    tracing::debug!(config_file = %path.display(), %format, "Reading configuration file");
    let text = fs::read_to_string(path).map_err(|source| Error::Unreadable {
        path: path.to_owned(),
        source,
    })?;

    let base_dir = base_dir_of(path)?;
    let descriptors = load_str(&text, format, &base_dir)?;

    tracing::info!(
        config_file = %path.display(),
        apps = descriptors.len(),
        "Loaded configuration"
    );
    Ok(descriptors)
}

/// Validates an in-memory configuration document. Relative paths are
/// resolved against `base_dir`, which should be absolute.
///
/// Descriptors are returned in document order. The first invalid record
/// aborts the load.
pub fn load_str(
    text: &str,
    format: ConfigFormat,
    base_dir: &Path,
) -> Result<Vec<ProcessDescriptor>, Error> {
    let config = Config::parse(text, format)?;

    let mut validator = Validator {
        base_dir: base_dir.clean(),
        seen: HashMap::with_capacity(config.apps.len()),
    };

    config
        .apps
        .into_iter()
        .enumerate()
        .map(|(index, app)| validator.validate(index, app))
        .collect()
}

struct Validator {
    base_dir: PathBuf,

    /// Names accepted so far, with the index of the record that used
    /// them.
    seen: HashMap<String, usize>,
}

impl Validator {
    fn validate(&mut self, index: usize, app: AppConfig) -> Result<ProcessDescriptor, Error> {
        let name = app.name.ok_or(Error::MissingField {
            index,
            name: None,
            field: "name",
        })?;
        let record = Record { index, name };
        if record.name.trim().is_empty() {
            return Err(record.invalid("name", "must not be empty"));
        }

        let command = app.command.ok_or_else(|| Error::MissingField {
            index,
            name: Some(record.name.clone()),
            field: "command",
        })?;

        if let Some(&first_index) = self.seen.get(&record.name) {
            return Err(Error::DuplicateName {
                name: record.name,
                first_index,
                index,
            });
        }

        let working_directory = match app.cwd {
            Some(cwd) => resolve(&self.base_dir, record.non_empty_path("cwd", &cwd)?),
            None => self.base_dir.clone(),
        };

        let command = resolve_command(
            &working_directory,
            record.non_empty_path("command", &command)?,
        );

        let instance_count = match app.instances {
            None => NonZeroU32::new(1),
            Some(instances) => u32::try_from(instances).ok().and_then(NonZeroU32::new),
        }
        .ok_or_else(|| {
            record.invalid(
                "instances",
                format!("must be a positive integer, got {}", app.instances.unwrap_or_default()),
            )
        })?;

        let execution_mode = match app.exec_mode {
            Some(mode) => mode
                .parse::<ExecutionMode>()
                .map_err(|reason| record.invalid("exec_mode", reason))?,
            None => ExecutionMode::default(),
        };

        let watch = match app.watch {
            WatchConfig::Toggle(false) => WatchMode::Disabled,
            WatchConfig::Toggle(true) => WatchMode::WorkingDirectory,
            WatchConfig::Paths(paths) if paths.is_empty() => WatchMode::Disabled,
            WatchConfig::Paths(paths) => WatchMode::Paths(
                paths
                    .iter()
                    .map(|path| {
                        record
                            .non_empty_path("watch", path)
                            .map(|path| resolve(&working_directory, path))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };

        let mut environment = BTreeMap::new();
        for (key, value) in app.env {
            if key.is_empty() || key.contains(['=', '\0']) {
                return Err(record.invalid(
                    "env",
                    format!("{key:?} is not a valid environment variable name"),
                ));
            }
            environment.insert(key, value.into_string());
        }

        let stdout_log_path = app
            .out_file
            .map(|path| {
                record
                    .non_empty_path("out_file", &path)
                    .map(|path| resolve(&working_directory, path))
            })
            .transpose()?;
        let stderr_log_path = app
            .error_file
            .map(|path| {
                record
                    .non_empty_path("error_file", &path)
                    .map(|path| resolve(&working_directory, path))
            })
            .transpose()?;

        let log_timestamp_format = app
            .log_date_format
            .map(|pattern| {
                LogTimestampFormat::new(&pattern)
                    .map_err(|err| record.invalid("log_date_format", err.to_string()))
            })
            .transpose()?;

        let max_restarts = match app.max_restarts {
            None => 0,
            Some(max_restarts) => u32::try_from(max_restarts).map_err(|_| {
                record.invalid(
                    "max_restarts",
                    format!("must be a non-negative integer, got {max_restarts}"),
                )
            })?,
        };

        let min_uptime = match app.min_uptime {
            None => Duration::ZERO,
            Some(min_uptime) => min_uptime
                .to_duration()
                .map_err(|reason| record.invalid("min_uptime", reason))?,
        };

        tracing::debug!(
            app_name = %record.name,
            index,
            command = %command.display(),
            working_directory = %working_directory.display(),
            "Validated process descriptor"
        );

        self.seen.insert(record.name.clone(), index);

        Ok(ProcessDescriptor {
            name: record.name,
            command,
            args: app.args.0,
            working_directory,
            instance_count,
            execution_mode,
            watch,
            environment,
            stdout_log_path,
            stderr_log_path,
            log_timestamp_format,
            merge_logs: app.merge_logs.unwrap_or(false),
            auto_restart: app.autorestart.unwrap_or(true),
            max_restarts,
            min_uptime,
        })
    }
}

/// The record currently being validated, for error reporting.
struct Record {
    index: usize,
    name: String,
}

impl Record {
    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> Error {
        Error::InvalidValue {
            index: self.index,
            name: self.name.clone(),
            field,
            reason: reason.into(),
        }
    }

    fn non_empty_path<'a>(&self, field: &'static str, path: &'a str) -> Result<&'a Path, Error> {
        if path.trim().is_empty() {
            Err(self.invalid(field, "path must not be empty"))
        } else {
            Ok(Path::new(path))
        }
    }
}

fn base_dir_of(config_file: &Path) -> Result<PathBuf, Error> {
    let parent = config_file.parent().unwrap_or_else(|| Path::new(""));
    if parent.is_absolute() {
        return Ok(parent.clean());
    }

    let current_dir = env::current_dir().map_err(|source| Error::Unreadable {
        path: config_file.to_owned(),
        source,
    })?;
    Ok(current_dir.join(parent).clean())
}

/// Resolves a program path. Paths with a directory component are
/// relative to the working directory; bare program names are kept for
/// `PATH` lookup.
fn resolve_command(working_directory: &Path, command: &Path) -> PathBuf {
    if command.components().count() > 1 {
        resolve(working_directory, command)
    } else {
        command.to_owned()
    }
}

/// Joins `path` onto `base` and lexically removes `.` and `..`
/// components without touching the filesystem.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    base.join(path).clean()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;

    use super::{resolve, resolve_command};

    #[test]
    fn resolves_lexically() {
        let resolved = |base: &str, path: &str| resolve(Path::new(base), Path::new(path));

        assert_eq!(PathBuf::from("/srv/app"), resolved("/srv", "./app/"));
        assert_eq!(PathBuf::from("/srv/logs"), resolved("/srv/app", "../logs"));
        assert_eq!(PathBuf::from("/logs"), resolved("/", "../../logs"));
        assert_eq!(PathBuf::from("../logs"), resolved(".", "../logs"));
        assert_eq!(PathBuf::from("."), resolved(".", "./"));
    }

    #[test]
    fn absolute_paths_ignore_base() {
        assert_eq!(
            PathBuf::from("/var/log/app.log"),
            resolve(Path::new("/srv/app"), Path::new("/var/log/app.log"))
        );
    }

    #[test]
    fn relative_paths_join_base() {
        assert_eq!(
            PathBuf::from("/srv/app/logs/out.log"),
            resolve(Path::new("/srv/app"), Path::new("./logs/out.log"))
        );
    }

    #[test]
    fn bare_commands_stay_on_path() {
        assert_eq!(
            PathBuf::from("python3"),
            resolve_command(Path::new("/srv/app"), Path::new("python3"))
        );
        assert_eq!(
            PathBuf::from("/srv/app/venv/bin/python"),
            resolve_command(Path::new("/srv/app"), Path::new("./venv/bin/python"))
        );
        assert_eq!(
            PathBuf::from("/usr/bin/node"),
            resolve_command(Path::new("/srv/app"), Path::new("/usr/bin/node"))
        );
    }
}
