//! JSON persistence for corpora and snapshots.
//!
//! A snapshot directory holds two files:
//!
//! - `card_index.json`: `{"0": "lightning bolt", "1": "counterspell", ...}`
//! - `adjacency.json`: the sparse matrix
//!
//! Affinities are cheap to derive and are recomputed on load.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::affinity::Normalization;
use crate::card_index::CardIndex;
use crate::collection::Collection;
use crate::matrix::{AdjacencyMatrix, MatrixError};
use crate::snapshot::Snapshot;

pub const CARD_INDEX_FILE: &str = "card_index.json";
pub const ADJACENCY_FILE: &str = "adjacency.json";

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The id map skips a position or maps two positions to one key.
    InvalidIdMap(String),
    InvalidMatrix(MatrixError),
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::Io(err)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Json(err)
    }
}

impl From<MatrixError> for SnapshotError {
    fn from(err: MatrixError) -> Self {
        SnapshotError::InvalidMatrix(err)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "I/O error: {}", e),
            SnapshotError::Json(e) => write!(f, "JSON error: {}", e),
            SnapshotError::InvalidIdMap(msg) => write!(f, "Invalid card id map: {}", msg),
            SnapshotError::InvalidMatrix(e) => write!(f, "Invalid adjacency matrix: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(e) => Some(e),
            SnapshotError::Json(e) => Some(e),
            SnapshotError::InvalidIdMap(_) => None,
            SnapshotError::InvalidMatrix(e) => Some(e),
        }
    }
}

/// Read a corpus stored as a JSON array of card-name arrays.
///
/// Names are canonicalized with [`normalize_card_name`](crate::collection::normalize_card_name).
pub fn read_corpus<R: Read>(reader: R) -> Result<Vec<Collection>, SnapshotError> {
    let lists: Vec<Vec<String>> = serde_json::from_reader(reader)?;
    Ok(lists.into_iter().map(Collection::from_names).collect())
}

pub fn load_corpus(path: &Path) -> Result<Vec<Collection>, SnapshotError> {
    let corpus = read_corpus(BufReader::new(File::open(path)?))?;
    log::debug!("loaded {} collections from {}", corpus.len(), path.display());
    Ok(corpus)
}

pub fn write_card_index<W: Write>(index: &CardIndex, writer: W) -> Result<(), SnapshotError> {
    let id_map: BTreeMap<u32, &str> = index.iter().map(|(id, key)| (id.0, key)).collect();
    serde_json::to_writer(writer, &id_map)?;
    Ok(())
}

/// Read an id map, requiring positions `0..n` with no gaps or repeated keys.
pub fn read_card_index<R: Read>(reader: R) -> Result<CardIndex, SnapshotError> {
    let id_map: BTreeMap<u32, String> = serde_json::from_reader(reader)?;
    let mut index = CardIndex::new();
    for (expected, (position, key)) in id_map.into_iter().enumerate() {
        if position as usize != expected {
            return Err(SnapshotError::InvalidIdMap(format!(
                "expected position {expected}, found {position}"
            )));
        }
        if index.contains(&key) {
            return Err(SnapshotError::InvalidIdMap(format!(
                "key '{key}' appears at more than one position"
            )));
        }
        index.register(&key);
    }
    Ok(index)
}

pub fn write_matrix<W: Write>(matrix: &AdjacencyMatrix, writer: W) -> Result<(), SnapshotError> {
    serde_json::to_writer(writer, matrix)?;
    Ok(())
}

/// Decode a matrix as stored. Structural checks run in
/// [`Snapshot::from_parts`], or call [`AdjacencyMatrix::validate`] directly.
pub fn read_matrix<R: Read>(reader: R) -> Result<AdjacencyMatrix, SnapshotError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write `card_index.json` and `adjacency.json` into `dir`, creating it.
pub fn save_snapshot(snapshot: &Snapshot, dir: &Path) -> Result<(), SnapshotError> {
    fs::create_dir_all(dir)?;

    let mut index_out = BufWriter::new(File::create(dir.join(CARD_INDEX_FILE))?);
    write_card_index(snapshot.index(), &mut index_out)?;
    index_out.flush()?;

    let mut matrix_out = BufWriter::new(File::create(dir.join(ADJACENCY_FILE))?);
    write_matrix(snapshot.matrix(), &mut matrix_out)?;
    matrix_out.flush()?;

    log::info!("saved snapshot to {}", dir.display());
    Ok(())
}

pub fn load_snapshot(dir: &Path, normalization: Normalization) -> Result<Snapshot, SnapshotError> {
    let index = read_card_index(BufReader::new(File::open(dir.join(CARD_INDEX_FILE))?))?;
    let matrix = read_matrix(BufReader::new(File::open(dir.join(ADJACENCY_FILE))?))?;
    let snapshot = Snapshot::from_parts(index, matrix, normalization)?;
    log::info!(
        "loaded snapshot from {}: {} cards",
        dir.display(),
        snapshot.index().len()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_corpus_normalizes_names() {
        let json = r#"[["Sol Ring", "Mana Vault", "sol ring"], ["Æther Vial"]]"#;
        let corpus = read_corpus(json.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(
            corpus[0].keys().collect::<Vec<_>>(),
            vec!["sol ring", "mana vault"]
        );
        assert_eq!(corpus[1].keys().collect::<Vec<_>>(), vec!["aether vial"]);
    }

    #[test]
    fn test_card_index_id_map_format() {
        let mut index = CardIndex::new();
        index.register("sol ring");
        index.register("mana vault");
        let mut out = Vec::new();
        write_card_index(&index, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"0":"sol ring","1":"mana vault"}"#
        );
    }

    #[test]
    fn test_read_card_index_rejects_gaps() {
        let err = read_card_index(r#"{"0": "a", "2": "b"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidIdMap(_)));
    }

    #[test]
    fn test_read_card_index_rejects_duplicate_keys() {
        let err = read_card_index(r#"{"0": "a", "1": "a"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidIdMap(_)));
    }

    #[test]
    fn test_read_card_index_accepts_unordered_object() {
        let index = read_card_index(r#"{"1": "b", "0": "a"}"#.as_bytes()).unwrap();
        assert_eq!(index.keys(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_tampered_matrix_rejected_when_assembled() {
        use crate::snapshot::BuildOptions;

        let corpus = vec![Collection::new(["a", "b"]), Collection::new(["b", "c"])];
        let built = Snapshot::build(&corpus, BuildOptions::default());
        let mut out = Vec::new();
        write_matrix(built.matrix(), &mut out).unwrap();

        let mut value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        value["counts"][0] = serde_json::json!(5);
        let tampered = read_matrix(value.to_string().as_bytes()).unwrap();
        assert!(tampered.validate().is_err());

        let err = Snapshot::from_parts(built.index().clone(), tampered, Normalization::Conditional)
            .unwrap_err();
        assert!(matches!(
            SnapshotError::from(err),
            SnapshotError::InvalidMatrix(_)
        ));
    }

    #[test]
    fn test_read_matrix_rejects_malformed_json() {
        let err = read_matrix("{\"offsets\": [0]}".as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
