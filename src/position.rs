//! Source positions, locations, timestamps and code addresses
//!
//! [`FilePosition`] is the identity of every entry in a [`crate::log::Log`]:
//! two entries with the same position are the same entry. Lines and columns
//! are stored zero-based and rendered one-based, like editors display them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing `file:line:column` text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionParseError {
    #[error("Expected 'file:line:column', got '{0}'")]
    MissingComponent(String),

    #[error("Invalid {component} '{value}' in position (must be a positive integer)")]
    InvalidNumber {
        component: &'static str,
        value: String,
    },
}

/// A position in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilePosition {
    /// File path or URI as reported by the engine
    pub file: String,
    /// Zero-based line
    pub line: u32,
    /// Zero-based column
    pub column: u32,
}

impl FilePosition {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Last path segment of the file, or the whole file text if it has none
    pub fn basename(&self) -> &str {
        basename(&self.file)
    }
}

/// Renders as `file:line:column` with one-based line and column
impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, u64::from(self.line) + 1, u64::from(self.column) + 1)
    }
}

impl FromStr for FilePosition {
    type Err = PositionParseError;

    /// Parses `file:line:column` (one-based). The file part may itself
    /// contain `:` (URIs, drive letters), so the text is split from the right.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(column), Some(line), Some(file)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(PositionParseError::MissingComponent(s.to_string()));
        };
        if file.is_empty() {
            return Err(PositionParseError::MissingComponent(s.to_string()));
        }
        Ok(Self {
            file: file.to_string(),
            line: parse_one_based("line", line)?,
            column: parse_one_based("column", column)?,
        })
    }
}

fn parse_one_based(component: &'static str, value: &str) -> Result<u32, PositionParseError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(PositionParseError::InvalidNumber {
            component,
            value: value.to_string(),
        }),
    }
}

/// Zero-based line/column pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Half-open range between two positions in one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// A navigable source range (the "reference location" of an entry)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub range: Range,
}

impl Location {
    /// Zero-width location at a file position
    pub fn at(position: &FilePosition) -> Self {
        let start = Position {
            line: position.line,
            column: position.column,
        };
        Self {
            file: position.file.clone(),
            range: Range { start, end: start },
        }
    }

    /// Short `basename:line:column` form (one-based) used in reports
    pub fn short_label(&self) -> String {
        format!(
            "{}:{}:{}",
            basename(&self.file),
            u64::from(self.range.start.line) + 1,
            u64::from(self.range.start.column) + 1
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file,
            u64::from(self.range.start.line) + 1,
            u64::from(self.range.start.column) + 1
        )
    }
}

/// Label for an optional location, `<unknown>` when absent
pub fn format_location(location: Option<&Location>) -> String {
    location
        .map(Location::short_label)
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn basename(file: &str) -> &str {
    let trimmed = file.trim_end_matches(['/', '\\']);
    Path::new(trimmed)
        .file_name()
        .and_then(|name| name.to_str())
        .or_else(|| trimmed.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or(file)
}

/// Microseconds since the start of the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

/// High-precision milliseconds (e.g. `12.345ms`)
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}ms", self.as_millis_f64())
    }
}

/// Address of a code object in the engine heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
