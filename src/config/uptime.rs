//! Minimum uptime configuration.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(ms|s|m|h)?\s*$")
        .expect("Failed to compile regular expression")
});

/// Minimum uptime, given either as a plain number of seconds or as a
/// duration string with a unit suffix (`500ms`, `10s`, `5m`, `1h`).
///
/// Plain numbers are seconds, not milliseconds as in pm2: a pm2-style
/// `min_uptime = 1000` means 1000 seconds here. Write `"1000ms"` (or
/// `"1s"`) to carry such a value over unchanged.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UptimeConfig {
    Seconds(f64),

    Text(String),
}

impl UptimeConfig {
    pub fn to_duration(&self) -> Result<Duration, String> {
        match self {
            Self::Seconds(seconds) => seconds_to_duration(*seconds),
            Self::Text(text) => parse_duration(text),
        }
    }
}

fn parse_duration(text: &str) -> Result<Duration, String> {
    let caps = DURATION_RE
        .captures(text)
        .ok_or_else(|| format!("{text:?} is not a duration (expected e.g. \"10s\" or \"500ms\")"))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| format!("{text:?} is not a duration"))?;

    let seconds = match caps.get(2).map(|unit| unit.as_str()) {
        Some("ms") => value / 1000.0,
        Some("m") => value * 60.0,
        Some("h") => value * 3600.0,
        Some(_) | None => value,
    };

    seconds_to_duration(seconds)
}

fn seconds_to_duration(seconds: f64) -> Result<Duration, String> {
    if seconds < 0.0 {
        return Err(format!("must not be negative, got {seconds}"));
    }

    Duration::try_from_secs_f64(seconds).map_err(|err| format!("{seconds} seconds: {err}"))
}
