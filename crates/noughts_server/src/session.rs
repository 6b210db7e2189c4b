//! The single live session: up to two players and at most one match.

use chrono::{NaiveDateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use noughts_game::{Board, Match, MoveOutcome, RejectReason, Symbol, Winner};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Players per match.
pub const MAX_PLAYERS: usize = 2;

/// A registered participant. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Player {
    /// Mail address used for the end-of-match notification.
    identity: String,
    /// Display name.
    name: String,
    /// Which symbol this player uses (X or O).
    symbol: Symbol,
}

/// A match that has just reached a win or draw, with both participants.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct FinishedMatch {
    board: Board,
    winner: Winner,
    player_x: Player,
    player_o: Player,
    finished_at: NaiveDateTime,
}

impl FinishedMatch {
    /// Builds the finish message for a terminal match.
    pub fn new(board: Board, winner: Winner, player_x: Player, player_o: Player) -> Self {
        Self {
            board,
            winner,
            player_x,
            player_o,
            finished_at: Utc::now().naive_utc(),
        }
    }

    /// Identities of both participants, X first.
    pub fn recipients(&self) -> Vec<String> {
        vec![
            self.player_x.identity.clone(),
            self.player_o.identity.clone(),
        ]
    }
}

/// Receives finished matches. Must not block.
pub trait FinishSink: std::fmt::Debug + Send + Sync {
    /// Hands a finished match off for notification and persistence.
    fn dispatch(&self, finished: FinishedMatch);
}

impl FinishSink for UnboundedSender<FinishedMatch> {
    fn dispatch(&self, finished: FinishedMatch) {
        if let Err(e) = self.send(finished) {
            warn!(winner = %e.0.winner, "Finish worker is gone, dropping finished match");
        }
    }
}

/// Registration refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum JoinRejection {
    /// Both symbols are taken.
    #[display("full")]
    Full,
}

/// Move refused by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveRejection {
    /// Fewer than two players registered.
    #[display("not started")]
    NotStarted,
    /// The match refused the move.
    #[display("move rejected")]
    Rejected(#[error(not(source))] RejectReason),
}

impl MoveRejection {
    /// Detail for a refused move, `None` before the match starts.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            MoveRejection::NotStarted => None,
            MoveRejection::Rejected(reason) => Some(*reason),
        }
    }
}

/// Match state returned after an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MoveSnapshot {
    board: Board,
    turn: Symbol,
    terminal: bool,
    winner: Option<Winner>,
}

impl From<&Match> for MoveSnapshot {
    fn from(game: &Match) -> Self {
        Self {
            board: game.board().clone(),
            turn: game.turn(),
            terminal: game.is_terminal(),
            winner: game.winner(),
        }
    }
}

/// Read-only view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSnapshot {
    /// Waiting for players.
    NotStarted {
        /// Players registered so far.
        player_count: usize,
    },
    /// A match exists.
    Started {
        /// Current board.
        board: Board,
        /// Symbol to move.
        turn: Symbol,
        /// True after a win or draw.
        terminal: bool,
        /// Winner, if finished.
        winner: Option<Winner>,
        /// Display name per symbol.
        names: HashMap<Symbol, String>,
    },
}

#[derive(Debug, Default)]
struct SessionState {
    players: Vec<Player>,
    current: Option<Match>,
}

impl SessionState {
    fn finished_match(&self, board: Board, winner: Winner) -> Option<FinishedMatch> {
        match self.players.as_slice() {
            [x, o] => Some(FinishedMatch::new(board, winner, x.clone(), o.clone())),
            other => {
                warn!(player_count = other.len(), "Match finished without two players");
                None
            }
        }
    }
}

/// The one shared session.
///
/// Every operation takes the lock for its whole duration, so joins, moves,
/// reads and resets never interleave. The finish notification is handed to
/// the sink after the lock is released.
#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionState>,
    sink: Box<dyn FinishSink>,
}

impl Session {
    /// Creates an empty session that reports finished matches to `sink`.
    #[instrument(skip(sink))]
    pub fn new(sink: impl FinishSink + 'static) -> Self {
        info!("Creating session");
        Self {
            state: Mutex::new(SessionState::default()),
            sink: Box::new(sink),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State is only mutated by non-panicking code, so a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a player and returns the assigned symbol.
    ///
    /// The first player gets X, the second O. The match starts the moment
    /// the second player joins.
    #[instrument(skip(self, identity, name))]
    pub fn register_player(
        &self,
        identity: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Symbol, JoinRejection> {
        let mut state = self.lock();
        let name = name.into();

        if state.players.len() >= MAX_PLAYERS {
            warn!(name = %name, "Session already has 2 players");
            return Err(JoinRejection::Full);
        }

        let symbol = if state.players.is_empty() {
            Symbol::X
        } else {
            Symbol::O
        };
        info!(name = %name, %symbol, "Registering player");
        state
            .players
            .push(Player::new(identity.into(), name, symbol));

        if state.players.len() == MAX_PLAYERS {
            info!("Second player joined, starting match");
            state.current = Some(Match::new());
        }

        Ok(symbol)
    }

    /// Submits a move for `symbol` at `position`.
    ///
    /// When this move ends the match, exactly one [`FinishedMatch`] goes to
    /// the sink.
    #[instrument(skip(self))]
    pub fn submit_move(
        &self,
        symbol: Symbol,
        position: usize,
    ) -> Result<MoveSnapshot, MoveRejection> {
        let (snapshot, finished) = {
            let mut state = self.lock();
            let Some(game) = state.current.as_mut() else {
                debug!("Move before match start");
                return Err(MoveRejection::NotStarted);
            };

            match game.attempt_move(position, symbol) {
                MoveOutcome::Rejected(reason) => {
                    warn!(%reason, "Move rejected");
                    return Err(MoveRejection::Rejected(reason));
                }
                MoveOutcome::Continues => (MoveSnapshot::from(&*game), None),
                MoveOutcome::GameOver(winner) => {
                    info!(%winner, "Match over");
                    let snapshot = MoveSnapshot::from(&*game);
                    let finished = state.finished_match(snapshot.board.clone(), winner);
                    (snapshot, finished)
                }
            }
        };

        if let Some(finished) = finished {
            self.sink.dispatch(finished);
        }

        Ok(snapshot)
    }

    /// Reads the current state without changing it.
    #[instrument(skip(self))]
    pub fn read_state(&self) -> StateSnapshot {
        let state = self.lock();
        match &state.current {
            None => StateSnapshot::NotStarted {
                player_count: state.players.len(),
            },
            Some(game) => StateSnapshot::Started {
                board: game.board().clone(),
                turn: game.turn(),
                terminal: game.is_terminal(),
                winner: game.winner(),
                names: state
                    .players
                    .iter()
                    .map(|p| (p.symbol, p.name.clone()))
                    .collect(),
            },
        }
    }

    /// Drops both players and any match.
    #[instrument(skip(self))]
    pub fn reset(&self) {
        let mut state = self.lock();
        info!(
            player_count = state.players.len(),
            had_match = state.current.is_some(),
            "Resetting session"
        );
        *state = SessionState::default();
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.lock().players.len()
    }

    /// Registered players in join order.
    pub fn players(&self) -> Vec<Player> {
        self.lock().players.clone()
    }
}
