use serde::{Deserialize, Serialize};

use super::tile::Idx;
use crate::error::{Error, Result};

pub const BOARD_SIZE: usize = 4;

/// Value held by one board slot; 0 marks an empty slot, anything else is
/// a power of two starting at 2. Wide enough for 131072, the largest
/// tile a 4x4 grid can produce.
pub type Cell = u32;

pub type Score = u32;

/// Direction represents the slide requested by the player.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

impl Direction {
    /// Clockwise rotations that bring this slide onto a left slide.
    ///
    /// The counts are an input contract shared with the swipe recognizer:
    /// Up and Down are crossed relative to grid coordinates and the
    /// recognizer compensates on its side, so they must not be "fixed"
    /// here.
    fn rotations(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Up => 1,
            Self::Right => 2,
            Self::Down => 3,
        }
    }
}

/// Shift is the outcome of sliding a board in one direction: the
/// resulting grid, the points earned, the slots whose value was produced
/// by a merge, and whether anything moved at all.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Shift {
    pub board: Board,
    pub score_delta: Score,
    pub merged_idxs: Vec<Idx>,
    pub changed: bool,
}

/// Board is the 4x4 grid of slot values.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Board {
    slots: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Builds a board from raw slot values, rejecting anything that is
    /// neither empty nor a power of two tile.
    pub fn from_cells(slots: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Result<Self> {
        for row in &slots {
            for &value in row {
                if value != 0 && (value < 2 || !value.is_power_of_two()) {
                    return Err(Error::InvalidCellValue(value));
                }
            }
        }
        Ok(Self { slots })
    }

    pub fn get(&self, idx: &Idx) -> Cell {
        self.slots[idx.1][idx.0]
    }

    pub(crate) fn set(&mut self, idx: &Idx, value: Cell) {
        self.slots[idx.1][idx.0] = value;
    }

    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.slots
    }

    /// Returns this board rotated 90 degrees clockwise. Four rotations
    /// return the original board.
    pub fn rotated(&self) -> Board {
        let mut rotated = Board::default();
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                rotated.slots[x][BOARD_SIZE - 1 - y] = self.slots[y][x];
            }
        }
        rotated
    }

    /// Slides the board in the given direction: every line compacts
    /// toward the wall the tiles travel to and equal neighbors combine
    /// once each. The board itself is untouched; randomness and scoring
    /// side effects live in the session.
    pub fn shifted(&self, direction: Direction) -> Shift {
        let rotations = direction.rotations();
        let mut board = self.clone();
        for _ in 0..rotations {
            board = board.rotated();
        }

        let mut score_delta = 0;
        let mut merged_idxs = Vec::new();
        for y in 0..BOARD_SIZE {
            let (collapsed, delta, merges) = collapse_row(board.slots[y]);
            board.slots[y] = collapsed;
            score_delta += delta;
            merged_idxs.extend(merges.into_iter().map(|x| Idx(x, y)));
        }

        // counter-rotate back to the caller's orientation, carrying the
        // merge positions along
        for _ in 0..(4 - rotations) % 4 {
            board = board.rotated();
            for idx in merged_idxs.iter_mut() {
                *idx = idx.rotated();
            }
        }

        let changed = board != *self;
        Shift {
            board,
            score_delta,
            merged_idxs,
            changed,
        }
    }

    /// True while the player still has a legal shift: an open slot, or an
    /// equal adjacent pair in some row or column. Every row and column is
    /// scanned; a board with a single open slot is never terminal.
    pub fn can_move(&self) -> bool {
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                if self.slots[y][x] == 0 {
                    return true;
                }
            }
        }

        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE - 1 {
                if self.slots[y][x] != 0 && self.slots[y][x] == self.slots[y][x + 1] {
                    return true;
                }
            }
        }

        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE - 1 {
                if self.slots[y][x] != 0 && self.slots[y][x] == self.slots[y + 1][x] {
                    return true;
                }
            }
        }

        false
    }

    /// The open slots in row-major order.
    pub fn empty_idxs(&self) -> Vec<Idx> {
        let mut empties = Vec::new();
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                if self.slots[y][x] == 0 {
                    empties.push(Idx(x, y));
                }
            }
        }
        empties
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.slots {
            for value in row {
                if *value == 0 {
                    write!(f, "|{: ^6}", ".")?;
                } else {
                    write!(f, "|{: ^6}", value)?;
                }
            }
            writeln!(f, "|")?;
        }
        Ok(())
    }
}

/// Collapses one row toward index 0: zeros drop out, equal adjacent
/// values combine once each left to right, the tail is padded back out
/// with zeros. Returns the new row, the points earned, and the indices
/// of the slots holding a combined value.
///
/// A combined slot never combines again in the same pass, so
/// `[2, 2, 2, 2]` collapses to `[4, 4, 0, 0]` rather than `[8, 0, 0, 0]`.
fn collapse_row(row: [Cell; BOARD_SIZE]) -> ([Cell; BOARD_SIZE], Score, Vec<usize>) {
    let mut packed: Vec<Cell> = row.iter().copied().filter(|&value| value != 0).collect();

    let mut delta = 0;
    let mut merged_at = Vec::new();
    let mut i = 0;
    while i + 1 < packed.len() {
        if packed[i] == packed[i + 1] {
            packed[i] *= 2;
            delta += packed[i];
            packed.remove(i + 1);
            merged_at.push(i);
        }
        i += 1;
    }

    let mut collapsed = [0; BOARD_SIZE];
    collapsed[..packed.len()].copy_from_slice(&packed);
    (collapsed, delta, merged_at)
}
