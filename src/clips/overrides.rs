//! Per-video start time overrides.
//!
//! The override file is plain text, one `name<delimiter>seconds` pair per
//! line. Lines starting with `#` are comments, blank lines are ignored.
//!
//! ```text
//! # clips that need a better starting point
//! clip2.mp4|42
//! 07_chorus_late.mkv|95.5
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

/// Mapping from clip identifier to start offset in seconds.
///
/// Built once per run, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartOverrideMap {
    starts: HashMap<String, f64>,
}

impl StartOverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a file on disk
    pub fn from_file<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::parse(&content, delimiter, &path.display().to_string())
    }

    /// Parse override rows. `source` only labels error messages.
    ///
    /// A malformed row aborts the whole parse.
    pub fn parse(content: &str, delimiter: char, source: &str) -> Result<Self> {
        let mut map = Self::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;

            // comments take precedence over field splitting
            if raw_line.starts_with('#') {
                continue;
            }

            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let malformed = |reason: String| ConfigError::Format {
                path: source.to_string(),
                line_number,
                line: raw_line.to_string(),
                reason,
            };

            let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
            if fields.len() != 2 {
                return Err(malformed(format!(
                    "expected 2 fields separated by {:?}, found {}",
                    delimiter,
                    fields.len()
                ))
                .into());
            }

            let (identifier, value) = (fields[0], fields[1]);
            if identifier.is_empty() {
                return Err(malformed("empty video name".to_string()).into());
            }

            let start: f64 = value
                .parse()
                .map_err(|_| malformed(format!("start second {:?} is not a number", value)))?;
            if !start.is_finite() || start < 0.0 {
                return Err(malformed(format!(
                    "start second {} must be a non-negative number",
                    value
                ))
                .into());
            }

            if let Some(previous) = map.starts.insert(identifier.to_string(), start) {
                warn!(
                    "Duplicate start override for {} on line {}: {} replaces {}",
                    identifier, line_number, start, previous
                );
            }
            debug!("Start override: {} -> {}s", identifier, start);
        }

        Ok(map)
    }

    /// Configured start offset for a clip, if any
    pub fn get(&self, identifier: &str) -> Option<f64> {
        self.starts.get(identifier).copied()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.starts.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Identifiers with an override, sorted
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.starts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, f64)> for StartOverrideMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            starts: iter.into_iter().collect(),
        }
    }
}
