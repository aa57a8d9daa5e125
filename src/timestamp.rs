//! Log timestamp formats.
//!
//! Log date patterns use the moment.js token vocabulary that process
//! supervisor configuration files are usually written with
//! (`YYYY-MM-DD HH:mm:ss Z`). Patterns are translated into a [`time`]
//! format description when the configuration is loaded, so that an
//! unusable pattern is rejected up front rather than when the first
//! log line is written.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use time::{format_description, OffsetDateTime};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\[[^\]]*\]|YYYY|YY|DDDo|Do|Mo|do|MMMM|MMM|MM|M|dddd|ddd|DDDD|DDD|DD|D|",
        r"HH|H|hh|h|mm|m|ss|s|SSS|ZZ|Z|A|a",
    ))
    .expect("Failed to compile regular expression")
});

/// Letters that moment.js treats as tokens but which have no
/// translation; rejecting them avoids silently printing them verbatim.
const UNSUPPORTED_TOKENS: &str = "dEeGgkNnQSWwXxY";

/// Ordinal-suffixed tokens (`5th`), which `time` cannot produce.
const UNSUPPORTED_ORDINALS: [&str; 4] = ["DDDo", "Do", "Mo", "do"];

/// Errors produced while translating or applying a log date pattern.
#[derive(Debug, thiserror::Error)]
pub enum TimestampFormatError {
    #[error("date pattern is empty")]
    Empty,

    #[error("unsupported date token `{0}`")]
    UnsupportedToken(String),

    #[error("invalid format description")]
    Description(#[from] time::error::InvalidFormatDescription),

    #[error("unable to format timestamp")]
    Format(#[from] time::error::Format),
}

/// A validated log line timestamp pattern.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LogTimestampFormat {
    pattern: String,
    description: String,
}

impl LogTimestampFormat {
    pub fn new(pattern: &str) -> Result<Self, TimestampFormatError> {
        if pattern.trim().is_empty() {
            return Err(TimestampFormatError::Empty);
        }

        let description = translate(pattern)?;
        format_description::parse(&description)?;

        Ok(Self {
            pattern: pattern.to_owned(),
            description,
        })
    }

    /// The pattern as written in the configuration file.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The equivalent `time` format description.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn format(&self, datetime: OffsetDateTime) -> Result<String, TimestampFormatError> {
        let items = format_description::parse(&self.description)?;
        Ok(datetime.format(&items[..])?)
    }
}

impl fmt::Display for LogTimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl Serialize for LogTimestampFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pattern)
    }
}

fn translate(pattern: &str) -> Result<String, TimestampFormatError> {
    let mut description = String::with_capacity(pattern.len() * 2);
    let mut last = 0;

    for token in TOKEN_RE.find_iter(pattern) {
        push_literal(&mut description, &pattern[last..token.start()], true)?;
        last = token.end();

        let text = token.as_str();
        if let Some(escaped) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            push_literal(&mut description, escaped, false)?;
            continue;
        }

        if UNSUPPORTED_ORDINALS.contains(&text) {
            return Err(TimestampFormatError::UnsupportedToken(text.to_owned()));
        }

        description.push_str(match text {
            "YYYY" => "[year]",
            "YY" => "[year repr:last_two]",
            "MMMM" => "[month repr:long]",
            "MMM" => "[month repr:short]",
            "MM" => "[month]",
            "M" => "[month padding:none]",
            "dddd" => "[weekday]",
            "ddd" => "[weekday repr:short]",
            "DDDD" => "[ordinal]",
            "DDD" => "[ordinal padding:none]",
            "DD" => "[day]",
            "D" => "[day padding:none]",
            "HH" => "[hour]",
            "H" => "[hour padding:none]",
            "hh" => "[hour repr:12]",
            "h" => "[hour repr:12 padding:none]",
            "mm" => "[minute]",
            "m" => "[minute padding:none]",
            "ss" => "[second]",
            "s" => "[second padding:none]",
            "SSS" => "[subsecond digits:3]",
            "Z" => "[offset_hour sign:mandatory]:[offset_minute]",
            "ZZ" => "[offset_hour sign:mandatory][offset_minute]",
            "A" => "[period]",
            "a" => "[period case:lower]",
            _ => unreachable!("token regex matched {text:?}"),
        });
    }

    push_literal(&mut description, &pattern[last..], true)?;
    Ok(description)
}

fn push_literal(
    description: &mut String,
    literal: &str,
    check_tokens: bool,
) -> Result<(), TimestampFormatError> {
    for c in literal.chars() {
        if check_tokens && UNSUPPORTED_TOKENS.contains(c) {
            return Err(TimestampFormatError::UnsupportedToken(c.to_string()));
        }
        if c == '[' {
            description.push('[');
        }
        description.push(c);
    }
    Ok(())
}
