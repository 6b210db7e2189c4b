//! Noughts game logic - a single 3x3 match between two symbols.
//!
//! This crate holds no I/O. It knows how to validate a move, place it,
//! and decide whether the match has been won or drawn.
//!
//! # Example
//!
//! ```
//! use noughts_game::{Match, MoveOutcome, Symbol, Winner};
//!
//! let mut game = Match::new();
//! for (pos, symbol) in [(0, Symbol::X), (3, Symbol::O), (1, Symbol::X), (4, Symbol::O)] {
//!     assert_eq!(game.attempt_move(pos, symbol), MoveOutcome::Continues);
//! }
//! assert_eq!(game.attempt_move(2, Symbol::X), MoveOutcome::GameOver(Winner::X));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod game;
mod position;
mod rules;
mod types;

pub use game::{Match, MoveOutcome, Phase, RejectReason};
pub use position::Position;
pub use rules::{LINES, has_line, is_full};
pub use types::{Board, Square, Symbol, TokenError, Winner};
