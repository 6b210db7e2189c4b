//! The match state machine.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::rules::{has_line, is_full};
use crate::{Board, Position, Square, Symbol, Winner};

/// Why a move was refused. The match is unchanged when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The match already has a winner or is drawn.
    #[display("game finished")]
    Finished,
    /// Position outside 0-8.
    #[display("position out of bounds")]
    OutOfBounds,
    /// Cell already holds a symbol.
    #[display("cell occupied")]
    Occupied,
    /// Symbol does not match the current turn.
    #[display("not your turn")]
    WrongTurn,
}

/// Result of [`Match::attempt_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Move placed, turn passed to the other symbol.
    Continues,
    /// Move placed and the match is now over.
    GameOver(Winner),
    /// Move refused, nothing changed.
    Rejected(RejectReason),
}

impl MoveOutcome {
    /// True for both accepted variants.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MoveOutcome::Rejected(_))
    }
}

/// Where the match is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the given symbol to move.
    WaitingForMove(Symbol),
    /// Terminal, frozen.
    Finished(Winner),
}

/// One match: a board, whose turn it is, and how it ended.
///
/// Created in `WaitingForMove(X)`. Once finished the board, turn and
/// winner never change again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    board: Board,
    turn: Symbol,
    terminal: bool,
    winner: Option<Winner>,
}

impl Match {
    /// Creates a fresh match with X to move.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Symbol::X,
            terminal: false,
            winner: None,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Symbol expected to move next (frozen once terminal).
    pub fn turn(&self) -> Symbol {
        self.turn
    }

    /// True after a win or draw.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Winner, `None` while the match is running.
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match self.winner {
            Some(winner) if self.terminal => Phase::Finished(winner),
            _ => Phase::WaitingForMove(self.turn),
        }
    }

    /// Places `symbol` at `position` if the move is legal.
    ///
    /// Checks, in order: match still running, position in bounds, cell
    /// empty, symbol on turn. An accepted move is then scored: a completed
    /// line wins, otherwise a full board draws, otherwise the turn flips.
    #[instrument(skip(self), fields(turn = %self.turn))]
    pub fn attempt_move(&mut self, position: usize, symbol: Symbol) -> MoveOutcome {
        if self.terminal {
            return self.reject(RejectReason::Finished);
        }
        let Some(pos) = Position::from_index(position) else {
            return self.reject(RejectReason::OutOfBounds);
        };
        if !self.board.is_empty(pos) {
            return self.reject(RejectReason::Occupied);
        }
        if symbol != self.turn {
            return self.reject(RejectReason::WrongTurn);
        }

        self.board.set(pos, Square::Occupied(symbol));

        if has_line(&self.board, symbol) {
            return self.finish(Winner::from(symbol));
        }
        if is_full(&self.board) {
            return self.finish(Winner::Draw);
        }

        self.turn = symbol.opponent();
        debug!(next = %self.turn, "Move accepted");
        MoveOutcome::Continues
    }

    fn reject(&self, reason: RejectReason) -> MoveOutcome {
        debug!(%reason, "Move rejected");
        MoveOutcome::Rejected(reason)
    }

    fn finish(&mut self, winner: Winner) -> MoveOutcome {
        self.terminal = true;
        self.winner = Some(winner);
        debug!(%winner, "Match finished");
        MoveOutcome::GameOver(winner)
    }
}

impl Default for Match {
    fn default() -> Self {
        Self::new()
    }
}
