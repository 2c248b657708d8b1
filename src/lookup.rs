//! Content keys and lookup tables.
//!
//! Two databases may assign different citation keys to the same work. A
//! content key identifies a work by its title and year, insensitive to case,
//! whitespace and punctuation, so entries can be matched across databases.

use std::collections::hash_map::{self, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::bib::BibEntry;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Errors that can occur when building a lookup table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("Duplicate content key \"{content_key}\" (entries '{first}' and '{second}')")]
    DuplicateContentKey {
        content_key: String,
        first: String,
        second: String,
    },

    #[error("Entry '{key}' has no title")]
    MissingTitle { key: String },
}

/// Strips every non-word character from a title and lowercases it.
///
/// # Examples
///
/// ```
/// use cite_rekey::simplify_title;
///
/// assert_eq!(simplify_title("Example Paper!!"), "examplepaper");
/// ```
pub fn simplify_title(title: &str) -> String {
    NON_WORD.replace_all(title, "").to_lowercase()
}

/// Builds the content key of an entry from its title and optional year.
pub fn content_key(title: &str, year: Option<&str>) -> String {
    let mut key = simplify_title(title);
    key.push_str(year.unwrap_or(""));
    key
}

/// Mapping from content key to citation key for one database.
///
/// Pairs keep the order of the entries in the bibliography file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl LookupTable {
    /// Builds the table for one database.
    ///
    /// # Errors
    ///
    /// Fails if an entry has no title, or if two entries share a content key.
    /// Both are fatal: the database cannot be matched unambiguously.
    pub fn build(entries: &[BibEntry]) -> Result<Self, LookupError> {
        let mut table = LookupTable::default();

        for entry in entries {
            let title = entry.title.as_deref().ok_or_else(|| LookupError::MissingTitle {
                key: entry.key.clone(),
            })?;
            let content_key = content_key(title, entry.year.as_deref());

            match table.index.entry(content_key.clone()) {
                hash_map::Entry::Occupied(existing) => {
                    return Err(LookupError::DuplicateContentKey {
                        content_key,
                        first: table.entries[*existing.get()].1.clone(),
                        second: entry.key.clone(),
                    });
                }
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(table.entries.len());
                    table.entries.push((content_key, entry.key.clone()));
                }
            }
        }

        tracing::debug!(entries = table.len(), "lookup table built");
        Ok(table)
    }

    /// Returns the citation key stored for a content key.
    pub fn get(&self, content_key: &str) -> Option<&str> {
        self.index
            .get(content_key)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Iterates over `(content key, citation key)` pairs in bibliography order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_title_strips_punctuation_and_case() {
        assert_eq!(simplify_title("Example Paper!!"), "examplepaper");
        assert_eq!(simplify_title("  A Study: of Things, (Part 2)."), "astudyofthingspart2");
    }

    #[test]
    fn test_simplify_title_keeps_underscore_and_unicode_letters() {
        assert_eq!(simplify_title("snake_case Über-Analyse"), "snake_caseüberanalyse");
    }

    #[test]
    fn test_simplify_title_empty() {
        assert_eq!(simplify_title(""), "");
        assert_eq!(simplify_title("?!"), "");
    }

    #[test]
    fn test_content_key_with_and_without_year() {
        assert_eq!(content_key("Example Paper", Some("2020")), "examplepaper2020");
        assert_eq!(content_key("Example Paper", None), "examplepaper");
    }

    #[test]
    fn test_build_maps_content_key_to_citation_key() {
        // Given: two distinct entries
        let entries = vec![
            BibEntry::new("key1", Some("Example Paper"), Some("2020")),
            BibEntry::new("key2", Some("Another Paper"), None),
        ];

        // When: we build the table
        let table = LookupTable::build(&entries).unwrap();

        // Then: each content key resolves to its citation key
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("examplepaper2020"), Some("key1"));
        assert_eq!(table.get("anotherpaper"), Some("key2"));
        assert_eq!(table.get("missing"), None);
    }

    #[test]
    fn test_build_rejects_duplicate_content_key() {
        // Given: two entries that differ only by punctuation and case
        let entries = vec![
            BibEntry::new("a", Some("Deep Learning"), Some("2015")),
            BibEntry::new("b", Some("deep learning."), Some("2015")),
        ];

        // When: we build the table
        let result = LookupTable::build(&entries);

        // Then: construction fails naming both entries
        assert_eq!(
            result,
            Err(LookupError::DuplicateContentKey {
                content_key: "deeplearning2015".to_string(),
                first: "a".to_string(),
                second: "b".to_string(),
            })
        );
    }

    #[test]
    fn test_build_same_title_different_year_is_not_duplicate() {
        let entries = vec![
            BibEntry::new("a", Some("Annual Report"), Some("2019")),
            BibEntry::new("b", Some("Annual Report"), Some("2020")),
        ];
        let table = LookupTable::build(&entries).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_build_rejects_missing_title() {
        let entries = vec![BibEntry::new("untitled", None, Some("2020"))];
        let result = LookupTable::build(&entries);
        assert_eq!(
            result,
            Err(LookupError::MissingTitle {
                key: "untitled".to_string()
            })
        );
    }

    #[test]
    fn test_build_empty() {
        let table = LookupTable::build(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_iter_keeps_bibliography_order() {
        // Given: entries whose content keys are not in alphabetical order
        let entries = vec![
            BibEntry::new("z", Some("Zebra"), None),
            BibEntry::new("a", Some("Aardvark"), None),
            BibEntry::new("m", Some("Meerkat"), Some("2001")),
        ];

        // When: we build the table
        let table = LookupTable::build(&entries).unwrap();

        // Then: iteration follows the bibliography file
        let pairs: Vec<_> = table.iter().collect();
        assert_eq!(
            pairs,
            vec![("zebra", "z"), ("aardvark", "a"), ("meerkat2001", "m")]
        );
    }
}
