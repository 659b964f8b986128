use serde::{Deserialize, Serialize};

use super::board::{Cell, BOARD_SIZE};

/// Idx encapsulates the x and y coordinates of a board slot.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Idx(pub usize, pub usize);

impl std::fmt::Display for Idx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "idx({0},{1})", self.0, self.1)
    }
}

impl Idx {
    pub fn x(&self) -> usize {
        self.0
    }

    pub fn y(&self) -> usize {
        self.1
    }

    /// Maps this index through a single clockwise rotation of the grid.
    pub(crate) fn rotated(&self) -> Idx {
        Idx(BOARD_SIZE - 1 - self.1, self.0)
    }
}

/// Identifier of a live tile, monotonically increasing within a session.
pub type TileId = u64;

/// A placed, valued unit occupying one board slot.
///
/// `spawned` and `merged` exist for the presentation layer's animations
/// and carry no gameplay meaning. Tiles are rebuilt with fresh ids after
/// every successful shift, so an id never survives a move.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub value: Cell,
    pub idx: Idx,
    pub spawned: bool,
    pub merged: bool,
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::origin(Idx(0, 0), Idx(3, 0))]
    #[case::far_corner(Idx(3, 3), Idx(0, 3))]
    #[case::interior(Idx(1, 2), Idx(1, 1))]
    fn rotated(#[case] idx: Idx, #[case] expected: Idx) {
        assert_eq!(idx.rotated(), expected);
    }

    #[test]
    fn rotated_four_times_is_identity() {
        let initial = Idx(2, 1);
        let mut idx = initial.clone();
        for _ in 0..4 {
            idx = idx.rotated();
        }
        assert_eq!(initial, idx);
    }
}
