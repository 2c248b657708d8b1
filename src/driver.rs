//! Document discovery and batch rewriting.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::bib::BibEntry;
use crate::lookup::{LookupError, LookupTable};
use crate::report::{write_outcomes, FileReport, RunSummary};
use crate::rewrite::{rewrite_citations, Rewrite};

/// The pair of lookup tables a run rewrites with.
#[derive(Debug, Clone)]
pub struct Rekeyer {
    old: LookupTable,
    new: LookupTable,
}

impl Rekeyer {
    /// Builds both lookup tables.
    ///
    /// # Errors
    ///
    /// Fails on the first table that cannot be built; no document should be
    /// touched in that case.
    pub fn new(old_entries: &[BibEntry], new_entries: &[BibEntry]) -> Result<Self, LookupError> {
        Ok(Self {
            old: LookupTable::build(old_entries)?,
            new: LookupTable::build(new_entries)?,
        })
    }

    pub fn rewrite(&self, text: &str) -> Rewrite {
        rewrite_citations(text, &self.old, &self.new)
    }

    /// Rewrites `text` and writes the per-key diagnostics.
    pub fn rewrite_reporting<O: Write, E: Write>(
        &self,
        text: &str,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<Rewrite> {
        let rewrite = self.rewrite(text);
        write_outcomes(out, err, &rewrite.outcomes)?;
        Ok(rewrite)
    }
}

/// Recursively finds every file under `root` with the given extension,
/// sorted by path.
pub fn discover_documents(root: &Path, extension: &str) -> Vec<PathBuf> {
    let paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == extension).unwrap_or(false))
        .map(|e| e.path().to_path_buf())
        .collect();

    tracing::debug!(root = %root.display(), files = paths.len(), "documents discovered");
    paths
}

/// Options for [`rewrite_directory`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// File extension to look for, without the dot
    pub extension: String,
    /// Compute and report, but never write
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            extension: "tex".to_string(),
            dry_run: false,
        }
    }
}

/// Rewrites every matching document under `root` in place.
///
/// Unreadable or unwritable files and files whose rewritten text is empty
/// are reported on `err` and skipped. Failed keys are accumulated across all
/// files into the returned summary.
pub fn rewrite_directory<O: Write, E: Write>(
    rekeyer: &Rekeyer,
    root: &Path,
    options: &BatchOptions,
    out: &mut O,
    err: &mut E,
) -> io::Result<RunSummary> {
    let mut summary = RunSummary::default();

    for path in discover_documents(root, &options.extension) {
        writeln!(out, "{}", path.display())?;

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                writeln!(err, ">>> ERROR: Failed to read {}: {}", path.display(), e)?;
                continue;
            }
        };

        let rewrite = rekeyer.rewrite_reporting(&text, out, err)?;
        let failed_keys = rewrite.failed_keys();
        let mut report = FileReport {
            path: path.clone(),
            replacements: rewrite.replacements(),
            failed_keys,
            written: false,
        };
        tracing::debug!(
            path = %path.display(),
            replacements = report.replacements,
            failed = report.failed_keys.len(),
            "document rewritten"
        );

        if options.dry_run {
            summary.record(report);
            continue;
        }

        if rewrite.text.is_empty() {
            writeln!(err, ">>> ERROR: Failed to convert tex file {}", path.display())?;
        } else {
            match fs::write(&path, &rewrite.text) {
                Ok(()) => {
                    report.written = true;
                    writeln!(
                        out,
                        "---- Finished output to {} with {} failed keys ----",
                        path.display(),
                        report.failed_keys.len()
                    )?;
                }
                Err(e) => {
                    writeln!(err, ">>> ERROR: Failed to write {}: {}", path.display(), e)?;
                }
            }
        }
        summary.record(report);
    }

    Ok(summary)
}
