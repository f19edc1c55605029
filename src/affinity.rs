//! Directed affinity scores derived from raw co-occurrence counts.

use crate::ids::CardId;
use crate::matrix::AdjacencyMatrix;

/// How a row of raw counts is turned into affinities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// `co(i, j) / total(i)`: the fraction of collections holding card i
    /// that also hold card j.
    #[default]
    Conditional,
    /// `co(i, j) / sum_k co(i, k)`: each nonempty row sums to one.
    RowStochastic,
}

/// Normalized counterpart of an [`AdjacencyMatrix`].
///
/// Shares the sparsity pattern of the source matrix. Not symmetric: each row
/// is scaled by its own card's baseline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AffinityMatrix {
    rows: Vec<Vec<(CardId, f64)>>,
    normalization: Normalization,
}

impl AffinityMatrix {
    pub fn from_adjacency(matrix: &AdjacencyMatrix, normalization: Normalization) -> Self {
        let rows = (0..matrix.dim())
            .map(CardId::from_index)
            .map(|card| {
                let denominator = match normalization {
                    Normalization::Conditional => u64::from(matrix.total_count(card)),
                    Normalization::RowStochastic => matrix.row_sum(card),
                };
                if denominator == 0 {
                    return Vec::new();
                }
                let denominator = denominator as f64;
                matrix
                    .row(card)
                    .map(|(other, count)| (other, f64::from(count) / denominator))
                    .collect()
            })
            .collect();
        Self {
            rows,
            normalization,
        }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Affinity of `from` toward `to`. Zero on the diagonal and for unknown
    /// positions.
    pub fn affinity(&self, from: CardId, to: CardId) -> f64 {
        let row = self.row(from);
        match row.binary_search_by_key(&to, |&(column, _)| column) {
            Ok(pos) => row[pos].1,
            Err(_) => 0.0,
        }
    }

    /// Nonzero affinities of a card, in ascending column order.
    pub fn row(&self, card: CardId) -> &[(CardId, f64)] {
        self.rows.get(card.index()).map(Vec::as_slice).unwrap_or(&[])
    }
}
