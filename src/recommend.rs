//! Co-occurrence recommendation and cut scoring.
//!
//! Both engines score with the same rule: a card's score is the sum of the
//! affinities between it and the cube members. Recommendations look at cards
//! outside the cube (highest first); cuts look at cards inside it (lowest
//! first). Ties are always broken by ascending card key so repeated calls
//! return identical lists.

use std::cmp::Ordering;

use crate::card_index::CardIndex;
use crate::collection::Collection;
use crate::ids::CardId;
use crate::snapshot::Snapshot;

/// A card key with the score it was ranked by.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub struct ScoredCard {
    pub key: String,
    pub score: f64,
}

impl ScoredCard {
    pub fn new(key: impl Into<String>, score: f64) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}

/// Ordered result of a recommendation or cut query.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize),
    serde(transparent)
)]
pub struct RankedRecommendation {
    cards: Vec<ScoredCard>,
}

impl RankedRecommendation {
    pub fn cards(&self) -> &[ScoredCard] {
        &self.cards
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(|card| card.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn into_vec(self) -> Vec<ScoredCard> {
        self.cards
    }

    /// Sort best-first (highest score) and keep the first `n`.
    pub fn highest_first(cards: Vec<ScoredCard>, n: usize) -> Self {
        Self::ranked(cards, n, |a, b| b.score.total_cmp(&a.score))
    }

    /// Sort lowest score first and keep the first `n`.
    pub fn lowest_first(cards: Vec<ScoredCard>, n: usize) -> Self {
        Self::ranked(cards, n, |a, b| a.score.total_cmp(&b.score))
    }

    fn ranked(
        mut cards: Vec<ScoredCard>,
        n: usize,
        by_score: impl Fn(&ScoredCard, &ScoredCard) -> Ordering,
    ) -> Self {
        cards.sort_by(|a, b| by_score(a, b).then_with(|| a.key.cmp(&b.key)));
        cards.truncate(n);
        Self { cards }
    }
}

impl IntoIterator for RankedRecommendation {
    type Item = ScoredCard;
    type IntoIter = std::vec::IntoIter<ScoredCard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedRecommendation {
    type Item = &'a ScoredCard;
    type IntoIter = std::slice::Iter<'a, ScoredCard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

/// Parse a user-supplied result count.
///
/// Negative amounts mean "nothing" and clamp to 0. Text that is not an
/// `i64` is an error.
pub fn parse_amount(raw: &str) -> Result<usize, std::num::ParseIntError> {
    let amount = raw.trim().parse::<i64>()?;
    Ok(usize::try_from(amount.max(0)).unwrap_or(usize::MAX))
}

/// Any source that can rank cards to add to a cube.
///
/// Implemented by the co-occurrence engine and by embedding-model adapters,
/// so callers can swap strategies without changing the call site.
pub trait Recommender {
    /// At most `n` cards not already in `collection`, best first.
    fn recommend(&self, collection: &Collection, n: usize) -> RankedRecommendation;
}

/// Query engine over one immutable [`Snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct CooccurrenceRecommender<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> CooccurrenceRecommender<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    fn index(&self) -> &'a CardIndex {
        self.snapshot.index()
    }

    /// Known members of the cube plus a dense membership mask.
    fn members(&self, collection: &Collection) -> (Vec<CardId>, Vec<bool>) {
        let members = self.index().resolve(collection);
        let mut mask = vec![false; self.index().len()];
        for id in &members {
            mask[id.index()] = true;
        }
        if members.len() < collection.len() {
            log::debug!(
                "ignoring {} of {} cube cards missing from the index",
                collection.len() - members.len(),
                collection.len()
            );
        }
        (members, mask)
    }

    /// Rank every card outside the cube by summed affinity from the members.
    pub fn recommend(&self, collection: &Collection, n: usize) -> RankedRecommendation {
        if n == 0 {
            return RankedRecommendation::default();
        }
        let affinity = self.snapshot.affinity();
        let (members, is_member) = self.members(collection);

        let mut scores = vec![0.0f64; self.index().len()];
        for &member in &members {
            for &(candidate, value) in affinity.row(member) {
                if !is_member[candidate.index()] {
                    scores[candidate.index()] += value;
                }
            }
        }

        let candidates = self
            .index()
            .iter()
            .filter(|(id, _)| !is_member[id.index()])
            .map(|(id, key)| ScoredCard::new(key, scores[id.index()]))
            .collect();
        RankedRecommendation::highest_first(candidates, n)
    }

    /// Rank cube members by summed affinity toward the other members,
    /// weakest first.
    ///
    /// Cubes with fewer than two known members have nothing to compare and
    /// produce an empty list.
    pub fn suggest_cuts(&self, collection: &Collection, n: usize) -> RankedRecommendation {
        let (members, is_member) = self.members(collection);
        if n == 0 || members.len() <= 1 {
            return RankedRecommendation::default();
        }
        let affinity = self.snapshot.affinity();
        let keys = self.index().keys();

        let scored = members
            .iter()
            .map(|&member| {
                let synergy = affinity
                    .row(member)
                    .iter()
                    .filter(|(other, _)| is_member[other.index()])
                    .map(|&(_, value)| value)
                    .sum();
                ScoredCard::new(keys[member.index()].as_str(), synergy)
            })
            .collect();
        RankedRecommendation::lowest_first(scored, n)
    }

    /// Cards with the highest affinity from `key`, excluding `key` itself
    /// and cards it never appeared with.
    pub fn neighbors(&self, key: &str, n: usize) -> RankedRecommendation {
        let Some(card) = self.index().get(key) else {
            return RankedRecommendation::default();
        };
        let keys = self.index().keys();
        let scored = self
            .snapshot
            .affinity()
            .row(card)
            .iter()
            .map(|&(other, value)| ScoredCard::new(keys[other.index()].as_str(), value))
            .collect();
        RankedRecommendation::highest_first(scored, n)
    }
}

impl Recommender for CooccurrenceRecommender<'_> {
    fn recommend(&self, collection: &Collection, n: usize) -> RankedRecommendation {
        CooccurrenceRecommender::recommend(self, collection, n)
    }
}
