//! Console diagnostics and run summaries.
//!
//! Successful replacements go to the `out` writer, failures to the `err`
//! writer. The binary passes stdout and stderr; tests pass buffers.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::rewrite::KeyOutcome;

/// Per-file result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub replacements: usize,
    pub failed_keys: BTreeSet<String>,
    /// Whether the rewritten text was persisted
    pub written: bool,
}

/// Summary of a whole run, accumulated across files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub failed_keys: BTreeSet<String>,
}

impl RunSummary {
    pub fn record(&mut self, report: FileReport) {
        self.failed_keys.extend(report.failed_keys.iter().cloned());
        self.files.push(report);
    }

    pub fn replacements(&self) -> usize {
        self.files.iter().map(|f| f.replacements).sum()
    }

    /// Failed keys joined by commas, in sorted order.
    pub fn failed_keys_line(&self) -> String {
        self.failed_keys
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes one diagnostic line per outcome that deserves one.
///
/// Keys that resolved but were never cited produce no output.
pub fn write_outcomes<O: Write, E: Write>(
    out: &mut O,
    err: &mut E,
    outcomes: &[KeyOutcome],
) -> io::Result<()> {
    for outcome in outcomes {
        match outcome {
            KeyOutcome::Replaced { old, new, count } => {
                writeln!(out, "[>] Replaced {} -> {} [{} replacements]", old, new, count)?;
            }
            KeyOutcome::Untouched { .. } => {}
            KeyOutcome::Unresolved { old } => {
                writeln!(
                    err,
                    "[!] Error replacing {}: Relevant entry not found in new bibliography (was it a duplicate?)",
                    old
                )?;
            }
            KeyOutcome::Invalid { old, reason } => {
                writeln!(err, "[!] Error replacing {}: {}", old, reason)?;
            }
        }
    }
    Ok(())
}
