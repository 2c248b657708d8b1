//! Citation key rewriting in LaTeX documents.
//!
//! Only the argument list of `\cite{...}` commands is touched. Each argument
//! is a comma-separated list of citation keys; a key is replaced only when it
//! matches an old key exactly, so `key1` never matches inside `key10` and
//! keys containing regex metacharacters are compared as plain text.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::lookup::LookupTable;

/// A `\cite{...}` command. The argument never crosses a closing brace.
static CITE_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\cite\{([^}]*)\}").unwrap());

/// What happened to one old citation key during a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was found in at least one citation command and rewritten.
    Replaced {
        old: String,
        new: String,
        count: usize,
    },
    /// The key resolved to a new key but is not cited in the document.
    Untouched { old: String, new: String },
    /// No entry with the same content exists in the new bibliography.
    Unresolved { old: String },
    /// The key cannot be substituted inside a citation command.
    Invalid { old: String, reason: String },
}

impl KeyOutcome {
    /// The old citation key this outcome is about.
    pub fn old_key(&self) -> &str {
        match self {
            KeyOutcome::Replaced { old, .. }
            | KeyOutcome::Untouched { old, .. }
            | KeyOutcome::Unresolved { old }
            | KeyOutcome::Invalid { old, .. } => old,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            KeyOutcome::Unresolved { .. } | KeyOutcome::Invalid { .. }
        )
    }

    pub fn replacements(&self) -> usize {
        match self {
            KeyOutcome::Replaced { count, .. } => *count,
            _ => 0,
        }
    }
}

/// The result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten document text
    pub text: String,
    /// One outcome per old key, in old bibliography order
    pub outcomes: Vec<KeyOutcome>,
}

impl Rewrite {
    /// Old keys that could not be resolved or substituted.
    pub fn failed_keys(&self) -> BTreeSet<String> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(|o| o.old_key().to_string())
            .collect()
    }

    /// Total number of replaced citation keys.
    pub fn replacements(&self) -> usize {
        self.outcomes.iter().map(KeyOutcome::replacements).sum()
    }
}

/// Rewrites every `\cite{...}` command in `text` from old to new keys.
///
/// Old keys are resolved through their content key: the key stored in `new`
/// under the same content key replaces the old one. All resolved keys are
/// applied in one pass, so a new key that equals some other old key is not
/// rewritten a second time.
///
/// # Examples
///
/// ```
/// use cite_rekey::{rewrite_citations, BibEntry, LookupTable};
///
/// let old = LookupTable::build(&[BibEntry::new("key1", Some("Example Paper"), Some("2020"))]).unwrap();
/// let new = LookupTable::build(&[BibEntry::new("key2", Some("Example Paper!!"), Some("2020"))]).unwrap();
///
/// let rewrite = rewrite_citations(r"\cite{key1,key3}", &old, &new);
/// assert_eq!(rewrite.text, r"\cite{key2,key3}");
/// assert_eq!(rewrite.replacements(), 1);
/// ```
pub fn rewrite_citations(text: &str, old: &LookupTable, new: &LookupTable) -> Rewrite {
    let mut outcomes: Vec<KeyOutcome> = Vec::with_capacity(old.len());
    // old key -> (new key, index into `outcomes`)
    let mut resolved: HashMap<&str, (&str, usize)> = HashMap::new();

    for (content_key, old_key) in old.iter() {
        let Some(new_key) = new.get(content_key) else {
            outcomes.push(KeyOutcome::Unresolved {
                old: old_key.to_string(),
            });
            continue;
        };
        if let Err(reason) = check_substitutable(old_key) {
            outcomes.push(KeyOutcome::Invalid {
                old: old_key.to_string(),
                reason: reason.to_string(),
            });
            continue;
        }
        resolved.entry(old_key).or_insert((new_key, outcomes.len()));
        outcomes.push(KeyOutcome::Untouched {
            old: old_key.to_string(),
            new: new_key.to_string(),
        });
    }

    let mut counts = vec![0usize; outcomes.len()];
    let rewritten = CITE_COMMAND.replace_all(text, |caps: &Captures<'_>| {
        let keys = caps[1]
            .split(',')
            .map(|token| match resolved.get(token.trim()) {
                Some(&(new_key, idx)) => {
                    counts[idx] += 1;
                    replace_token(token, new_key)
                }
                None => token.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",");
        format!("\\cite{{{}}}", keys)
    });
    let text = rewritten.into_owned();

    for (outcome, count) in outcomes.iter_mut().zip(counts) {
        if count == 0 {
            continue;
        }
        if let KeyOutcome::Untouched { old, new } = outcome {
            let (old, new) = (std::mem::take(old), std::mem::take(new));
            *outcome = KeyOutcome::Replaced { old, new, count };
        }
    }

    Rewrite { text, outcomes }
}

/// Rejects keys that can never appear as a single token of a `\cite` argument.
fn check_substitutable(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("empty citation key");
    }
    if key
        .chars()
        .any(|c| c == '{' || c == '}' || c == ',' || c.is_whitespace())
    {
        return Err("citation key contains a brace, comma or whitespace");
    }
    Ok(())
}

/// Replaces the key in `token`, keeping the whitespace around it.
fn replace_token(token: &str, new_key: &str) -> String {
    let leading = token.len() - token.trim_start().len();
    let trailing = token.len() - token.trim_end().len();
    format!(
        "{}{}{}",
        &token[..leading],
        new_key,
        &token[token.len() - trailing..]
    )
}
