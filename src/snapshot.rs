//! Immutable per-corpus state shared by every query.
//!
//! A [`Snapshot`] bundles the card index, the raw matrix and the affinity
//! matrix built from one corpus. It is never mutated after construction.
//! Rebuilding produces a new snapshot which [`SnapshotHandle::replace`]
//! publishes atomically; queries that already hold the old `Arc` finish on
//! the old data.

use std::sync::{Arc, RwLock};

use crate::affinity::{AffinityMatrix, Normalization};
use crate::card_index::CardIndex;
use crate::collection::Collection;
use crate::matrix::{AdjacencyMatrix, MatrixError, build_parallel, build_sequential};

/// Knobs for a batch build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Partition the corpus across the rayon pool.
    pub parallel: bool,
    pub normalization: Normalization,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            normalization: Normalization::Conditional,
        }
    }
}

/// Summary figures for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct SnapshotStats {
    pub cards: usize,
    pub pairs: usize,
    pub collections: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    index: CardIndex,
    matrix: AdjacencyMatrix,
    affinity: AffinityMatrix,
}

impl Snapshot {
    /// Index every card in the corpus and build its matrices.
    pub fn build(corpus: &[Collection], options: BuildOptions) -> Self {
        let index = CardIndex::from_corpus(corpus);
        Self::build_with_index(index, corpus, options)
    }

    /// Build against a fixed index; corpus cards it does not know are dropped.
    pub fn build_with_index(index: CardIndex, corpus: &[Collection], options: BuildOptions) -> Self {
        log::debug!(
            "building co-occurrence matrix: {} cards, {} collections, parallel={}",
            index.len(),
            corpus.len(),
            options.parallel
        );
        let matrix = if options.parallel {
            build_parallel(&index, corpus)
        } else {
            build_sequential(&index, corpus)
        };
        let affinity = AffinityMatrix::from_adjacency(&matrix, options.normalization);
        let snapshot = Self {
            index,
            matrix,
            affinity,
        };
        let stats = snapshot.stats();
        log::info!(
            "built snapshot: {} cards, {} pairs from {} collections",
            stats.cards,
            stats.pairs,
            stats.collections
        );
        snapshot
    }

    /// Assemble a snapshot from a previously persisted index and matrix.
    pub fn from_parts(
        index: CardIndex,
        matrix: AdjacencyMatrix,
        normalization: Normalization,
    ) -> Result<Self, MatrixError> {
        if matrix.dim() != index.len() {
            return Err(MatrixError::Shape {
                expected: index.len(),
                found: matrix.dim(),
            });
        }
        matrix.validate()?;
        let affinity = AffinityMatrix::from_adjacency(&matrix, normalization);
        Ok(Self {
            index,
            matrix,
            affinity,
        })
    }

    pub fn index(&self) -> &CardIndex {
        &self.index
    }

    pub fn matrix(&self) -> &AdjacencyMatrix {
        &self.matrix
    }

    pub fn affinity(&self) -> &AffinityMatrix {
        &self.affinity
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            cards: self.index.len(),
            pairs: self.matrix.pair_count(),
            collections: self.matrix.collection_count(),
        }
    }
}

/// Shared slot holding the snapshot that queries currently see.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub fn load(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Publish a freshly built snapshot, returning the one it replaces.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let stats = next.stats();
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = std::mem::replace(&mut *guard, next);
        log::info!(
            "swapped snapshot: {} -> {} cards",
            previous.index().len(),
            stats.cards
        );
        previous
    }
}
