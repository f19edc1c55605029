//! Cube lists and card name canonicalization.

use std::collections::HashSet;

use deunicode::deunicode;

/// Canonical form of a card name: ASCII transliteration, lowercase, trimmed.
///
/// "Lim-Dûl's Vault" and "lim-dul's vault" map to the same key.
pub fn normalize_card_name(name: &str) -> String {
    deunicode(name.trim()).to_lowercase()
}

/// One cube list.
///
/// Keeps the first occurrence of every key in the order it was given.
/// Duplicates are collapsed on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    keys: Vec<String>,
}

impl Collection {
    /// Create a collection from keys taken verbatim.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let keys = keys
            .into_iter()
            .map(Into::into)
            .filter(|key: &String| seen.insert(key.clone()))
            .collect();
        Self { keys }
    }

    /// Create a collection from display names, canonicalizing each one.
    ///
    /// Names that are empty after trimming are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| normalize_card_name(name.as_ref()))
                .filter(|key| !key.is_empty()),
        )
    }

    /// Parse a plain-text cube list with one card name per line.
    pub fn parse_list(text: &str) -> Self {
        Self::from_names(text.lines())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Collection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}
