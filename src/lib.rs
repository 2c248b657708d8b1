//! cite-rekey: migrate LaTeX citation keys between two BibTeX bibliographies.
//!
//! This library provides functionality to:
//! - Load BibTeX entries (key, title, year)
//! - Match entries across bibliographies by normalized title and year
//! - Rewrite `\cite{...}` commands from old keys to new keys
//! - Report replacements and unresolved keys, per file and per run

pub mod bib;
pub mod driver;
pub mod lookup;
pub mod report;
pub mod rewrite;

pub use bib::{load_bibliography, parse_bibliography, BibEntry, BibError};
pub use driver::{discover_documents, rewrite_directory, BatchOptions, Rekeyer};
pub use lookup::{content_key, simplify_title, LookupError, LookupTable};
pub use report::{write_outcomes, FileReport, RunSummary};
pub use rewrite::{rewrite_citations, KeyOutcome, Rewrite};
