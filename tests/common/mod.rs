//! Helper functions for flightplan integration tests

use std::path::{Path, PathBuf};

use flightplan::{ConfigFormat, Error, ErrorKind, ProcessDescriptor};
use tempfile::TempDir;

/// Base directory used when loading in-memory test documents.
#[allow(dead_code)]
pub const BASE_DIR: &str = "/srv/apps";

/// JSON rendition of the `ecosystem.config.js` file that a supervisor
/// deployment of the package manager service ships with.
#[allow(dead_code)]
pub const ECOSYSTEM_JSON: &str = r#"{
  "apps": [
    {
      "name": "package-manager",
      "script": "./venv/bin/python",
      "args": "-m uvicorn main:app --host 0.0.0.0 --port 5000",
      "cwd": "/home/antal/package-manager",
      "instances": 1,
      "exec_mode": "fork",
      "watch": false,
      "env": {
        "NODE_ENV": "production"
      },
      "error_file": "./logs/err.log",
      "out_file": "./logs/out.log",
      "log_date_format": "YYYY-MM-DD HH:mm:ss Z",
      "merge_logs": true,
      "autorestart": true,
      "max_restarts": 10,
      "min_uptime": "10s"
    }
  ]
}"#;

/// Loads a JSON document relative to [`BASE_DIR`].
#[allow(dead_code)]
pub fn load_json(json: &str) -> Result<Vec<ProcessDescriptor>, Error> {
    flightplan::load_str(json, ConfigFormat::Json, Path::new(BASE_DIR))
}

/// Loads a TOML document relative to [`BASE_DIR`].
#[allow(dead_code)]
pub fn load_toml(toml: &str) -> Result<Vec<ProcessDescriptor>, Error> {
    flightplan::load_str(toml, ConfigFormat::Toml, Path::new(BASE_DIR))
}

/// Writes `contents` to `file_name` inside a fresh temp directory and
/// returns the directory (which must be kept alive for the duration of
/// the test) and the full path to the file.
#[allow(dead_code)]
pub fn write_config(file_name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Asserts that the load failed with the given error kind and message.
#[allow(dead_code)]
pub fn assert_load_error(
    expected_kind: ErrorKind,
    expected_message: &str,
    result: Result<Vec<ProcessDescriptor>, Error>,
) {
    match result {
        Err(err) => {
            assert_eq!(expected_kind, err.kind(), "unexpected error: {err}");
            assert_eq!(expected_message, err.to_string());
        }
        Ok(descriptors) => panic!(
            "Expected {expected_kind} error, loaded {} descriptors.",
            descriptors.len()
        ),
    };
}
