//! BibTeX bibliography loading.
//!
//! Parsing is delegated to the `biblatex` crate. Only the fields needed to
//! match entries across databases are kept: the key, the title and the year.

use std::fs;
use std::path::Path;

use biblatex::{Bibliography, Entry, RetrievalError};
use thiserror::Error;

/// Errors that can occur when loading a bibliography.
#[derive(Error, Debug)]
pub enum BibError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid BibTeX: {0}")]
    ParseError(String),

    #[error("Invalid field '{field}' in entry '{key}': {reason}")]
    InvalidField {
        key: String,
        field: String,
        reason: String,
    },
}

/// A bibliography entry reduced to the fields used for content matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    /// The citation key, unique within its database
    pub key: String,
    pub title: Option<String>,
    pub year: Option<String>,
}

impl BibEntry {
    pub fn new(key: &str, title: Option<&str>, year: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            title: title.map(str::to_string),
            year: year.map(str::to_string),
        }
    }
}

/// Loads every entry of a `.bib` file, in file order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid BibTeX.
pub fn load_bibliography(path: &Path) -> Result<Vec<BibEntry>, BibError> {
    let content = fs::read_to_string(path)?;
    let entries = parse_bibliography(&content)?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "bibliography loaded");
    Ok(entries)
}

/// Parses BibTeX source into entries.
///
/// `@string` abbreviations and month macros are resolved by the parser.
pub fn parse_bibliography(src: &str) -> Result<Vec<BibEntry>, BibError> {
    let bibliography =
        Bibliography::parse(src).map_err(|e| BibError::ParseError(e.to_string()))?;

    bibliography
        .iter()
        .map(|entry| {
            Ok(BibEntry {
                key: entry.key.clone(),
                title: optional_field(entry, "title")?,
                year: optional_field(entry, "year")?,
            })
        })
        .collect()
}

fn optional_field(entry: &Entry, field: &str) -> Result<Option<String>, BibError> {
    match entry.get_as::<String>(field) {
        Ok(value) => Ok(Some(value)),
        Err(RetrievalError::Missing(_)) => Ok(None),
        Err(e) => Err(BibError::InvalidField {
            key: entry.key.clone(),
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}
