//! Game core for a vegetable-themed 2048 variant.
//!
//! The crate owns the board transformations and the session state machine.
//! Drawing tiles and recognizing swipes belong to the embedding
//! presentation layer, which feeds [`Direction`] values into a [`Session`]
//! and reads back the tile set, the score, and the game-over flag.
//!
//! ```
//! use veggie48::{Direction, Session};
//!
//! let mut session = Session::new(rand::thread_rng());
//! let outcome = session.apply(Direction::Left);
//! if outcome.changed {
//!     println!("score: {}", session.score());
//! }
//! ```

pub mod engine;
mod error;

pub use engine::board::{Board, Cell, Direction, Score, Shift, BOARD_SIZE};
pub use engine::session::{MoveOutcome, Session};
pub use engine::tile::{Idx, Tile, TileId};
pub use error::{Error, Result};
