use rand::distributions::Distribution;
use rand::distributions::WeightedIndex;
use rand::seq::IteratorRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::board::{Board, Cell, Direction, Score, BOARD_SIZE};
use super::tile::{Idx, Tile, TileId};

const SPAWN_CHOICES: [Cell; 2] = [2, 4];
const SPAWN_WEIGHTS: [u8; 2] = [9, 1];
const INITIAL_SPAWNS: usize = 2;

/// MoveOutcome reports what a single move attempt did, so the caller can
/// decide whether anything needs redrawing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub changed: bool,
    pub score_delta: Score,
    pub game_over: bool,
}

/// Session owns the live tile set and drives the playing/game-over state
/// machine on behalf of the presentation layer.
///
/// All randomness flows through the injected generator, so a seeded rng
/// makes an entire game deterministic.
pub struct Session {
    rng: Box<dyn RngCore>,
    tiles: Vec<Tile>,
    score: Score,
    next_id: TileId,
    over: bool,
    spawn_weights: WeightedIndex<u8>,
}

impl Session {
    /// Initialize a new session using the given random number generator.
    pub fn new(rng: impl RngCore + 'static) -> Self {
        let mut session = Self {
            rng: Box::new(rng),
            tiles: Vec::with_capacity(BOARD_SIZE * BOARD_SIZE),
            score: 0,
            next_id: 1,
            over: false,
            spawn_weights: WeightedIndex::new(SPAWN_WEIGHTS)
                .expect("SPAWN_WEIGHTS should never be empty"),
        };
        session.new_game();
        session
    }

    /// Start over: clears the board, the score, and the id counter, then
    /// seeds the grid with two spawned tiles. This is also the only way
    /// out of a finished game.
    pub fn new_game(&mut self) {
        self.tiles.clear();
        self.score = 0;
        self.next_id = 1;
        self.over = false;
        for _ in 0..INITIAL_SPAWNS {
            self.spawn_tile();
        }
        log::debug!("new game:\n{}", self.board());
    }

    /// The live tiles in creation order: the row-major rebuild of the
    /// last shift first, then the tile it spawned.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.over
    }

    /// Assembles the grid currently described by the tile set.
    pub fn board(&self) -> Board {
        let mut board = Board::default();
        for tile in &self.tiles {
            board.set(&tile.idx, tile.value);
        }
        board
    }

    /// Runs one transition of the state machine. A move that changes
    /// nothing has no effect of any kind, and every move after the game
    /// has ended is ignored the same way.
    pub fn apply(&mut self, direction: Direction) -> MoveOutcome {
        if self.over {
            return MoveOutcome {
                changed: false,
                score_delta: 0,
                game_over: true,
            };
        }

        let shift = self.board().shifted(direction);
        if !shift.changed {
            return MoveOutcome::default();
        }

        self.score += shift.score_delta;
        self.rebuild_tiles(&shift.board, &shift.merged_idxs);
        self.spawn_tile();

        if !self.board().can_move() {
            self.over = true;
            log::info!("game over, final score {}", self.score);
        }
        log::debug!("shifted {}, score {}:\n{}", direction, self.score, self.board());

        MoveOutcome {
            changed: true,
            score_delta: shift.score_delta,
            game_over: self.over,
        }
    }

    /// Replaces the tile set with freshly identified tiles read off the
    /// given board. Fine-grained tile identity is deliberately not
    /// carried across a shift.
    fn rebuild_tiles(&mut self, board: &Board, merged_idxs: &[Idx]) {
        self.tiles.clear();
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                let idx = Idx(x, y);
                let value = board.get(&idx);
                if value == 0 {
                    continue;
                }
                let id = self.take_id();
                self.tiles.push(Tile {
                    id,
                    value,
                    idx: idx.clone(),
                    spawned: false,
                    merged: merged_idxs.contains(&idx),
                });
            }
        }
    }

    /// Places one new tile on a uniformly chosen open slot, valued 2 nine
    /// times out of ten and 4 otherwise. A full board spawns nothing.
    fn spawn_tile(&mut self) {
        let board = self.board();
        let idx = match board.empty_idxs().into_iter().choose(&mut self.rng) {
            Some(idx) => idx,
            None => return,
        };
        let value = SPAWN_CHOICES[self.spawn_weights.sample(&mut self.rng)];
        let id = self.take_id();
        log::debug!("spawned {} at {}", value, idx);
        self.tiles.push(Tile {
            id,
            value,
            idx,
            spawned: true,
            merged: false,
        });
    }

    fn take_id(&mut self) -> TileId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[cfg(test)]
    pub(crate) fn set_board(&mut self, board: &Board) {
        self.rebuild_tiles(board, &[]);
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::*;

    use super::*;

    fn rng() -> SmallRng {
        let _ = env_logger::builder().is_test(true).try_init();
        SmallRng::seed_from_u64(42)
    }

    fn board(slots: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Board {
        Board::from_cells(slots).expect("test boards hold valid cell values")
    }

    // One left shift away from filling the last open slot; the spawn
    // that follows lands next to 8s whether it rolls a 2 or a 4.
    #[fixture]
    fn near_terminal() -> Board {
        board([
            [0, 8, 16, 8],
            [16, 8, 16, 8],
            [8, 16, 8, 16],
            [16, 8, 16, 8],
        ])
    }

    #[test]
    fn new_game_spawns_two_tiles() {
        let session = Session::new(rng());
        assert_eq!(session.tiles().len(), 2);
        assert_eq!(session.score(), 0);
        assert!(!session.is_game_over());
        for tile in session.tiles() {
            assert!(tile.spawned);
            assert!(!tile.merged);
            assert!(SPAWN_CHOICES.contains(&tile.value));
        }
        let ids: Vec<TileId> = session.tiles().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn board_reflects_tile_set() {
        let mut session = Session::new(rng());
        let slots = board([
            [2, 0, 4, 0],
            [0, 8, 0, 0],
            [0, 0, 16, 0],
            [2, 0, 0, 4],
        ]);
        session.set_board(&slots);
        assert_eq!(session.board(), slots);
    }

    #[test]
    fn changed_move_scores_rebuilds_and_spawns() {
        let mut session = Session::new(rng());
        session.set_board(&board([
            [2, 2, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ]));

        let outcome = session.apply(Direction::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.score_delta, 4);
        assert!(!outcome.game_over);
        assert_eq!(session.score(), 4);

        // the merged survivor plus exactly one spawned tile
        assert_eq!(session.tiles().len(), 2);
        let merged: Vec<&Tile> = session.tiles().iter().filter(|t| t.merged).collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, 4);
        assert_eq!(merged[0].idx, Idx(0, 0));
        assert!(!merged[0].spawned);
        let spawned: Vec<&Tile> = session.tiles().iter().filter(|t| t.spawned).collect();
        assert_eq!(spawned.len(), 1);
        assert!(SPAWN_CHOICES.contains(&spawned[0].value));

        let mut ids: Vec<TileId> = session.tiles().iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), session.tiles().len());
    }

    #[test]
    fn unchanged_move_has_no_effect() {
        let mut session = Session::new(rng());
        let slots = board([
            [0, 0, 0, 2],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ]);
        session.set_board(&slots);

        let outcome = session.apply(Direction::Right);
        assert!(!outcome.changed);
        assert_eq!(outcome.score_delta, 0);
        assert!(!outcome.game_over);
        assert_eq!(session.score(), 0);
        assert_eq!(session.tiles().len(), 1);
        assert_eq!(session.board(), slots);
    }

    #[rstest]
    fn filling_the_last_slot_ends_the_game(near_terminal: Board) {
        let mut session = Session::new(rng());
        session.set_board(&near_terminal);

        let outcome = session.apply(Direction::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.score_delta, 0);
        assert!(outcome.game_over);
        assert!(session.is_game_over());
        assert_eq!(session.tiles().len(), 16);
        assert!(!session.board().can_move());
    }

    #[rstest]
    fn moves_are_ignored_once_the_game_is_over(near_terminal: Board) {
        let mut session = Session::new(rng());
        session.set_board(&near_terminal);
        assert!(session.apply(Direction::Left).game_over);

        let before = session.board();
        let score = session.score();
        for direction in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            let outcome = session.apply(direction);
            assert!(!outcome.changed);
            assert!(outcome.game_over);
        }
        assert_eq!(session.board(), before);
        assert_eq!(session.score(), score);
    }

    #[rstest]
    fn new_game_leaves_game_over(near_terminal: Board) {
        let mut session = Session::new(rng());
        session.set_board(&near_terminal);
        session.apply(Direction::Left);
        assert!(session.is_game_over());

        session.new_game();
        assert!(!session.is_game_over());
        assert_eq!(session.score(), 0);
        assert_eq!(session.tiles().len(), 2);
        let ids: Vec<TileId> = session.tiles().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn spawning_on_a_full_board_changes_nothing() {
        let mut session = Session::new(rng());
        let full = board([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ]);
        session.set_board(&full);
        session.spawn_tile();
        assert_eq!(session.tiles().len(), 16);
        assert_eq!(session.board(), full);
    }

    #[test]
    fn spawn_favors_twos_nine_to_one() {
        let mut session = Session::new(rng());
        let total = 10_000;
        let mut fours = 0usize;
        for _ in 0..total {
            session.tiles.clear();
            session.spawn_tile();
            if session.tiles[0].value == 4 {
                fours += 1;
            }
        }
        let fraction = fours as f64 / total as f64;
        assert!(
            (0.08..=0.12).contains(&fraction),
            "fraction of 4s was {}",
            fraction
        );
    }

    #[test]
    fn spawn_reaches_every_open_slot() {
        let mut session = Session::new(rng());
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2_000 {
            session.tiles.clear();
            session.spawn_tile();
            seen.insert(session.tiles[0].idx.clone());
        }
        assert_eq!(seen.len(), BOARD_SIZE * BOARD_SIZE);
    }
}
