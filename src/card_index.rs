//! Bidirectional mapping between card keys and dense matrix positions.
//!
//! The index is filled once per corpus snapshot. Positions are handed out in
//! registration order, so every registered key owns exactly one row and one
//! column of the adjacency matrix.

use std::collections::HashMap;

use crate::collection::Collection;
use crate::ids::CardId;

/// Reverse lookup of a position that was never handed out.
///
/// Seeing this means a matrix and an index from different snapshots were
/// mixed, so callers should treat it as fatal rather than recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCardError {
    pub id: CardId,
    pub len: usize,
}

impl std::fmt::Display for UnknownCardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown card {}: index only holds {} cards",
            self.id, self.len
        )
    }
}

impl std::error::Error for UnknownCardError {}

/// Registry of card keys.
///
/// Provides lookup by key and by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardIndex {
    /// Keys indexed by position
    keys: Vec<String>,
    /// Positions indexed by key
    positions: HashMap<String, CardId>,
}

impl CardIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Create an index holding every card that appears in the corpus.
    ///
    /// Cards are registered in first-seen order, which keeps positions stable
    /// for a given corpus.
    pub fn from_corpus<'a>(corpus: impl IntoIterator<Item = &'a Collection>) -> Self {
        let mut index = Self::new();
        for collection in corpus {
            for key in collection.keys() {
                index.register(key);
            }
        }
        index
    }

    /// Register a card key, returning its position.
    ///
    /// Registering a known key returns the position it already has.
    pub fn register(&mut self, key: &str) -> CardId {
        if let Some(&id) = self.positions.get(key) {
            return id;
        }
        let id = CardId::from_index(self.keys.len());
        self.keys.push(key.to_string());
        self.positions.insert(key.to_string(), id);
        id
    }

    /// Look up the position of a key.
    pub fn get(&self, key: &str) -> Option<CardId> {
        self.positions.get(key).copied()
    }

    /// Check whether a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Look up the key stored at a position.
    pub fn key(&self, id: CardId) -> Result<&str, UnknownCardError> {
        self.keys
            .get(id.index())
            .map(String::as_str)
            .ok_or(UnknownCardError {
                id,
                len: self.keys.len(),
            })
    }

    /// Iterate over `(position, key)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (CardId, &str)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, key)| (CardId::from_index(i), key.as_str()))
    }

    /// Get all keys in position order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Get the number of registered cards.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolve a collection to sorted, deduplicated positions.
    ///
    /// Keys the index does not know are dropped.
    pub fn resolve(&self, collection: &Collection) -> Vec<CardId> {
        let mut ids: Vec<CardId> = collection
            .keys()
            .filter_map(|key| self.get(key))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
