//! Adapter for learned recommendation models.
//!
//! A model sees a cube as a binary membership vector over the card index and
//! answers with one score per card. The model itself (training, weights,
//! inference runtime) lives outside this crate; [`EmbeddingRecommender`]
//! only turns its raw output into a [`RankedRecommendation`] with the same
//! rules as the co-occurrence engine.

use crate::card_index::CardIndex;
use crate::collection::Collection;
use crate::recommend::{RankedRecommendation, Recommender, ScoredCard};

/// Scores every card given a cube's membership vector.
pub trait EmbeddingModel {
    /// `membership[i]` is 1.0 when the card at position i is in the cube.
    /// The result must hold one score per card, in index order.
    fn score(&self, membership: &[f32]) -> Vec<f32>;
}

impl<F> EmbeddingModel for F
where
    F: Fn(&[f32]) -> Vec<f32>,
{
    fn score(&self, membership: &[f32]) -> Vec<f32> {
        self(membership)
    }
}

pub struct EmbeddingRecommender<'a, M> {
    index: &'a CardIndex,
    model: M,
}

impl<'a, M: EmbeddingModel> EmbeddingRecommender<'a, M> {
    /// `index` must be the index the model was trained against.
    pub fn new(index: &'a CardIndex, model: M) -> Self {
        Self { index, model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: EmbeddingModel> Recommender for EmbeddingRecommender<'_, M> {
    fn recommend(&self, collection: &Collection, n: usize) -> RankedRecommendation {
        if n == 0 {
            return RankedRecommendation::default();
        }
        let mut membership = vec![0.0f32; self.index.len()];
        for id in self.index.resolve(collection) {
            membership[id.index()] = 1.0;
        }

        let scores = self.model.score(&membership);
        if scores.len() != membership.len() {
            log::warn!(
                "embedding model returned {} scores for {} cards; ignoring output",
                scores.len(),
                membership.len()
            );
            return RankedRecommendation::default();
        }

        let candidates = self
            .index
            .iter()
            .zip(membership.iter().zip(scores))
            .filter(|(_, (member, score))| **member == 0.0 && !score.is_nan())
            .map(|((_, key), (_, score))| ScoredCard::new(key, f64::from(score)))
            .collect();
        RankedRecommendation::highest_first(candidates, n)
    }
}
