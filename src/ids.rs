/// Dense position of a card inside a [`CardIndex`](crate::card_index::CardIndex).
///
/// Positions are assigned in registration order starting at 0 with no gaps,
/// so they double as row/column numbers of the adjacency matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a card ID from a matrix position.
    ///
    /// # Panics
    ///
    /// An index holds at most `u32::MAX + 1` cards; larger positions panic.
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("card position exceeds u32::MAX"))
    }

    /// Create a card ID from a raw value (for when you need explicit control).
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for CardId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
