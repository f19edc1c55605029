//! Sparse co-occurrence matrix and its batch builder.
//!
//! The frozen matrix is stored in compressed sparse rows. Both (i, j) and
//! (j, i) are materialized so a row scan sees every neighbor of a card.
//! The diagonal is never stored and reads as zero.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::card_index::CardIndex;
use crate::collection::Collection;
use crate::ids::CardId;

/// Structural problem found while validating a matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Offsets, columns, counts and totals disagree on the matrix shape.
    Shape { expected: usize, found: usize },
    /// A row's columns are not strictly increasing.
    UnsortedRow(CardId),
    /// A row stores an entry for its own card.
    DiagonalEntry(CardId),
    /// A column refers to a card past the end of the matrix.
    ColumnOutOfRange { row: CardId, column: CardId },
    /// A stored count is zero.
    ZeroEntry { row: CardId, column: CardId },
    /// (row, column) and (column, row) hold different counts.
    Asymmetric { row: CardId, column: CardId },
    /// A pair count is larger than one of the cards' totals.
    CountExceedsTotal {
        row: CardId,
        column: CardId,
        count: u32,
    },
}

impl std::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixError::Shape { expected, found } => {
                write!(f, "matrix shape mismatch: expected {expected}, found {found}")
            }
            MatrixError::UnsortedRow(row) => write!(f, "row {row} is not sorted"),
            MatrixError::DiagonalEntry(row) => write!(f, "row {row} stores a diagonal entry"),
            MatrixError::ColumnOutOfRange { row, column } => {
                write!(f, "row {row} refers to out-of-range column {column}")
            }
            MatrixError::ZeroEntry { row, column } => {
                write!(f, "entry ({row}, {column}) is stored with a zero count")
            }
            MatrixError::Asymmetric { row, column } => {
                write!(f, "entries ({row}, {column}) and ({column}, {row}) differ")
            }
            MatrixError::CountExceedsTotal { row, column, count } => write!(
                f,
                "entry ({row}, {column}) = {count} exceeds a card's total appearances"
            ),
        }
    }
}

impl std::error::Error for MatrixError {}

/// Symmetric co-occurrence counts plus per-card appearance totals.
///
/// Immutable once built. Entry (i, j) is the number of corpus collections
/// containing both cards; `total_count(i)` is the number containing card i.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AdjacencyMatrix {
    offsets: Vec<usize>,
    columns: Vec<CardId>,
    counts: Vec<u32>,
    totals: Vec<u32>,
    collections: u64,
}

impl AdjacencyMatrix {
    /// Number of cards (rows and columns).
    pub fn dim(&self) -> usize {
        self.totals.len()
    }

    /// Number of corpus collections folded into the matrix.
    pub fn collection_count(&self) -> u64 {
        self.collections
    }

    /// Number of distinct unordered card pairs with a nonzero count.
    pub fn pair_count(&self) -> usize {
        self.counts.len() / 2
    }

    /// Number of collections containing `card`. Zero for unknown positions.
    pub fn total_count(&self, card: CardId) -> u32 {
        self.totals.get(card.index()).copied().unwrap_or(0)
    }

    pub fn totals(&self) -> &[u32] {
        &self.totals
    }

    /// Number of collections containing both cards.
    pub fn co_occurrence(&self, a: CardId, b: CardId) -> u32 {
        let (columns, counts) = self.row_slices(a);
        match columns.binary_search(&b) {
            Ok(pos) => counts[pos],
            Err(_) => 0,
        }
    }

    /// Nonzero entries of a card's row, in ascending column order.
    pub fn row(&self, card: CardId) -> impl Iterator<Item = (CardId, u32)> + '_ {
        let (columns, counts) = self.row_slices(card);
        columns.iter().copied().zip(counts.iter().copied())
    }

    /// Sum of a card's off-diagonal row.
    pub fn row_sum(&self, card: CardId) -> u64 {
        let (_, counts) = self.row_slices(card);
        counts.iter().map(|&c| u64::from(c)).sum()
    }

    fn row_slices(&self, card: CardId) -> (&[CardId], &[u32]) {
        let i = card.index();
        if i >= self.dim() {
            return (&[], &[]);
        }
        let (start, end) = (self.offsets[i], self.offsets[i + 1]);
        (&self.columns[start..end], &self.counts[start..end])
    }

    /// Check every structural invariant of the matrix.
    ///
    /// Built matrices always pass; this guards matrices loaded from disk.
    pub fn validate(&self) -> Result<(), MatrixError> {
        let dim = self.dim();
        if self.offsets.len() != dim + 1 {
            return Err(MatrixError::Shape {
                expected: dim + 1,
                found: self.offsets.len(),
            });
        }
        if self.columns.len() != self.counts.len() {
            return Err(MatrixError::Shape {
                expected: self.columns.len(),
                found: self.counts.len(),
            });
        }
        if self.offsets[0] != 0 || self.offsets[dim] != self.columns.len() {
            return Err(MatrixError::Shape {
                expected: self.columns.len(),
                found: self.offsets[dim],
            });
        }
        if let Some(i) = self.offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(MatrixError::UnsortedRow(CardId::from_index(i)));
        }
        for i in 0..dim {
            let row = CardId::from_index(i);
            let (columns, counts) = self.row_slices(row);
            if columns.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MatrixError::UnsortedRow(row));
            }
            for (&column, &count) in columns.iter().zip(counts) {
                if column == row {
                    return Err(MatrixError::DiagonalEntry(row));
                }
                if column.index() >= dim {
                    return Err(MatrixError::ColumnOutOfRange { row, column });
                }
                if count == 0 {
                    return Err(MatrixError::ZeroEntry { row, column });
                }
                if self.co_occurrence(column, row) != count {
                    return Err(MatrixError::Asymmetric { row, column });
                }
                if count > self.total_count(row).min(self.total_count(column)) {
                    return Err(MatrixError::CountExceedsTotal { row, column, count });
                }
            }
        }
        Ok(())
    }
}

/// Accumulates co-occurrence counts for one partition of the corpus.
///
/// Pairs are keyed with the lower position first, so every unordered pair
/// has exactly one slot and symmetry holds by construction.
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    pairs: HashMap<(CardId, CardId), u32>,
    totals: Vec<u32>,
    collections: u64,
}

impl MatrixBuilder {
    /// Create a builder for a matrix with `dim` cards.
    pub fn new(dim: usize) -> Self {
        Self {
            pairs: HashMap::new(),
            totals: vec![0; dim],
            collections: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.totals.len()
    }

    /// Resolve a collection against the index and add it.
    pub fn add_collection(&mut self, index: &CardIndex, collection: &Collection) {
        let members = index.resolve(collection);
        self.add_members(&members);
    }

    /// Add one collection given as card positions, in any order.
    ///
    /// Repeated positions count once. Positions past the builder's dimension
    /// are ignored.
    pub fn add_members(&mut self, members: &[CardId]) {
        let dim = self.dim();
        let mut members: Vec<CardId> = members
            .iter()
            .copied()
            .filter(|id| id.index() < dim)
            .collect();
        members.sort_unstable();
        members.dedup();

        self.collections += 1;
        for (pos, &a) in members.iter().enumerate() {
            self.totals[a.index()] += 1;
            for &b in &members[pos + 1..] {
                *self.pairs.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    /// Element-wise sum of two partial builds.
    pub fn merge(self, other: Self) -> Self {
        let (mut big, small) = if self.pairs.len() >= other.pairs.len() {
            (self, other)
        } else {
            (other, self)
        };
        debug_assert_eq!(big.dim(), small.dim());
        for (pair, count) in small.pairs {
            *big.pairs.entry(pair).or_insert(0) += count;
        }
        for (total, extra) in big.totals.iter_mut().zip(small.totals) {
            *total += extra;
        }
        big.collections += small.collections;
        big
    }

    /// Freeze the accumulated counts into a matrix.
    pub fn finish(self) -> AdjacencyMatrix {
        let dim = self.dim();
        let mut rows: Vec<Vec<(CardId, u32)>> = vec![Vec::new(); dim];
        for ((a, b), count) in self.pairs {
            rows[a.index()].push((b, count));
            rows[b.index()].push((a, count));
        }

        let nnz = rows.iter().map(Vec::len).sum();
        let mut offsets = Vec::with_capacity(dim + 1);
        let mut columns = Vec::with_capacity(nnz);
        let mut counts = Vec::with_capacity(nnz);
        offsets.push(0);
        for mut row in rows {
            row.sort_unstable_by_key(|&(column, _)| column);
            for (column, count) in row {
                columns.push(column);
                counts.push(count);
            }
            offsets.push(columns.len());
        }

        AdjacencyMatrix {
            offsets,
            columns,
            counts,
            totals: self.totals,
            collections: self.collections,
        }
    }
}

/// Build the matrix in a single pass on the calling thread.
pub fn build_sequential<'a>(
    index: &CardIndex,
    corpus: impl IntoIterator<Item = &'a Collection>,
) -> AdjacencyMatrix {
    let mut builder = MatrixBuilder::new(index.len());
    for collection in corpus {
        builder.add_collection(index, collection);
    }
    builder.finish()
}

/// Build the matrix with one partial builder per rayon worker, then sum.
pub fn build_parallel(index: &CardIndex, corpus: &[Collection]) -> AdjacencyMatrix {
    let dim = index.len();
    corpus
        .par_iter()
        .fold(
            || MatrixBuilder::new(dim),
            |mut builder, collection| {
                builder.add_collection(index, collection);
                builder
            },
        )
        .reduce(|| MatrixBuilder::new(dim), MatrixBuilder::merge)
        .finish()
}
