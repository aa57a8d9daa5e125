//! Argument configuration

use serde::Deserialize;

/// Arguments passed to an app's command, given either as a single
/// whitespace-separated line or as a list of individual arguments.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(from = "ArgsLineOrVector")]
pub struct ArgsConfig(pub Vec<String>);

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(untagged)]
enum ArgsLineOrVector {
    ArgsLine(String),

    ArgsVector(Vec<String>),
}

impl From<ArgsLineOrVector> for ArgsConfig {
    fn from(config: ArgsLineOrVector) -> Self {
        match config {
            ArgsLineOrVector::ArgsLine(line) => {
                Self(line.split_whitespace().map(|s| s.to_owned()).collect())
            }
            ArgsLineOrVector::ArgsVector(v) => Self(v),
        }
    }
}
