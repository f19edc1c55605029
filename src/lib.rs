//! Cube card recommendations from corpus co-occurrence statistics.
//!
//! A corpus of cube lists is folded into a sparse, symmetric co-occurrence
//! matrix. Normalizing each row by its card's appearance count gives a
//! directed affinity, and summing affinities over a cube's members ranks
//! cards to add ([`CooccurrenceRecommender::recommend`]) or to cut
//! ([`CooccurrenceRecommender::suggest_cuts`]).
//!
//! ```
//! use cuberec::{BuildOptions, Collection, CooccurrenceRecommender, Snapshot};
//!
//! let corpus = vec![
//!     Collection::new(["a", "b", "c"]),
//!     Collection::new(["a", "b"]),
//!     Collection::new(["b", "c", "d"]),
//! ];
//! let snapshot = Snapshot::build(&corpus, BuildOptions::default());
//! let engine = CooccurrenceRecommender::new(&snapshot);
//!
//! let adds = engine.recommend(&Collection::new(["a", "b"]), 2);
//! assert_eq!(adds.keys().collect::<Vec<_>>(), vec!["c", "d"]);
//!
//! let cuts = engine.suggest_cuts(&Collection::new(["a", "b", "c"]), 1);
//! assert_eq!(cuts.keys().collect::<Vec<_>>(), vec!["b"]);
//! ```

pub mod affinity;
pub mod card_index;
pub mod collection;
pub mod embedding;
pub mod ids;
pub mod matrix;
#[cfg(feature = "serialization")]
pub mod persist;
pub mod recommend;
pub mod snapshot;

pub use affinity::{AffinityMatrix, Normalization};
pub use card_index::{CardIndex, UnknownCardError};
pub use collection::{Collection, normalize_card_name};
pub use embedding::{EmbeddingModel, EmbeddingRecommender};
pub use ids::CardId;
pub use matrix::{AdjacencyMatrix, MatrixBuilder, MatrixError, build_parallel, build_sequential};
#[cfg(feature = "serialization")]
pub use persist::{SnapshotError, load_corpus, load_snapshot, save_snapshot};
pub use recommend::{
    CooccurrenceRecommender, RankedRecommendation, Recommender, ScoredCard, parse_amount,
};
pub use snapshot::{BuildOptions, Snapshot, SnapshotHandle, SnapshotStats};
