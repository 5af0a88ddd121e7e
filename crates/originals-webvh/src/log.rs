//! # Version Log and JSONL Format
//!
//! The persisted form is newline-delimited JSON: one entry per line, in
//! append order. A single trailing newline is allowed; any blank or
//! unparsable interior line invalidates the whole load.

use crate::entry::{ActiveParameters, LogEntry};
use crate::error::WebvhError;

/// An ordered, append-only sequence of log entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DidLog {
    entries: Vec<LogEntry>,
}

impl DidLog {
    /// Wrap entries in append order.
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The genesis entry.
    pub fn first(&self) -> Option<&LogEntry> {
        self.entries.first()
    }

    /// The latest entry.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Parameters in force after the latest entry.
    ///
    /// This is a fold only; it does not check hashes or proofs.
    pub fn active_parameters(&self) -> Result<ActiveParameters, WebvhError> {
        let (first, rest) = self.entries.split_first().ok_or(WebvhError::EmptyLog)?;
        let mut active = ActiveParameters::genesis(&first.parameters, &first.version_id)?;
        for entry in rest {
            active = active.apply(&entry.parameters, &entry.version_id)?;
        }
        Ok(active)
    }

    pub(crate) fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Serialize as JSONL with a trailing newline.
    pub fn to_jsonl(&self) -> Result<String, WebvhError> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse JSONL. Errors name the 1-based line.
    pub fn from_jsonl(input: &str) -> Result<Self, WebvhError> {
        let body = input.strip_suffix('\n').unwrap_or(input);
        if body.is_empty() {
            return Err(WebvhError::EmptyLog);
        }
        let entries = body
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                let line_no = i + 1;
                let line = line.strip_suffix('\r').unwrap_or(line);
                if line.trim().is_empty() {
                    return Err(WebvhError::MalformedLine {
                        line: line_no,
                        reason: "blank line".to_string(),
                    });
                }
                serde_json::from_str::<LogEntry>(line).map_err(|e| WebvhError::MalformedLine {
                    line: line_no,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }
}
