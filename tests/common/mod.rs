//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

/// Old (paper) bibliography: `key1` is matched by content, `keyA` has no
/// counterpart in [`NEW_BIB`].
pub const OLD_BIB: &str = r#"
@article{key1,
  title = {Example Paper},
  year = {2020},
}
@misc{keyA,
  title = {Dropped Preprint},
  year = {2018},
}
"#;

/// New (complete) bibliography.
pub const NEW_BIB: &str = r#"
@article{key2,
  title = {Example Paper!!},
  year = {2020},
}
@book{key3,
  title = {Unrelated Book},
  year = {1999},
}
"#;

/// Build BibTeX source from `(key, title, year)` triples.
pub fn build_bib(entries: &[(&str, &str, Option<&str>)]) -> String {
    entries
        .iter()
        .map(|(key, title, year)| match year {
            Some(year) => format!("@article{{{}, title = {{{}}}, year = {{{}}}}}\n", key, title, year),
            None => format!("@article{{{}, title = {{{}}}}}\n", key, title),
        })
        .collect()
}
