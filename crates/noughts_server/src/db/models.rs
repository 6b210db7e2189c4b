//! Database models and their JSON views.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use noughts_game::Board;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::session::FinishedMatch;

/// Lifecycle tag stored in the `status` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordStatus {
    /// Match reached a win or draw.
    #[default]
    Completed,
    /// Record created for a match still running.
    Ongoing,
}

/// Stored game record.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRecord {
    id: i32,
    player_x_email: String,
    player_x_nick: String,
    player_o_email: String,
    player_o_nick: String,
    board: String,
    winner: Option<String>,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Identity and name of one side, as shown in record JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Mail address.
    pub email: String,
    /// Display name.
    pub nick: String,
}

/// JSON shape of a stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecordView {
    /// Record id.
    pub id: i32,
    /// The X side.
    pub player_x: PlayerView,
    /// The O side.
    pub player_o: PlayerView,
    /// Nine board tokens.
    pub board: Board,
    /// `"X"`, `"O"`, `"DRAW"` or null.
    pub winner: Option<String>,
    /// `"completed"` or `"ongoing"`.
    pub status: String,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last modification time.
    pub updated_at: NaiveDateTime,
}

impl GameRecord {
    /// Decodes the stored board column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the column is not a JSON array of 9 tokens.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn decode_board(&self) -> Result<Board, DbError> {
        Ok(serde_json::from_str(&self.board)?)
    }

    /// Builds the JSON view of this record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored board cannot be decoded.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn to_view(&self) -> Result<GameRecordView, DbError> {
        Ok(GameRecordView {
            id: self.id,
            player_x: PlayerView {
                email: self.player_x_email.clone(),
                nick: self.player_x_nick.clone(),
            },
            player_o: PlayerView {
                email: self.player_o_email.clone(),
                nick: self.player_o_nick.clone(),
            },
            board: self.decode_board()?,
            winner: self.winner.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable record.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::games)]
pub struct NewGameRecord {
    player_x_email: String,
    player_x_nick: String,
    player_o_email: String,
    player_o_nick: String,
    board: String,
    winner: Option<String>,
    status: String,
}

impl NewGameRecord {
    /// Record for a finished match, status `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the board cannot be encoded.
    #[instrument(skip(finished), fields(winner = %finished.winner()))]
    pub fn from_finished(finished: &FinishedMatch) -> Result<Self, DbError> {
        Ok(Self::new(
            finished.player_x().identity().clone(),
            finished.player_x().name().clone(),
            finished.player_o().identity().clone(),
            finished.player_o().name().clone(),
            serde_json::to_string(finished.board())?,
            Some(finished.winner().as_ref().to_string()),
            RecordStatus::Completed.as_ref().to_string(),
        ))
    }
}

/// Partial update. `None` fields are left as they are.
#[derive(Debug, Clone, AsChangeset, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRecordChanges {
    board: Option<String>,
    winner: Option<String>,
    status: Option<String>,
    updated_at: NaiveDateTime,
}

impl GameRecordChanges {
    /// Creates a change set stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the board cannot be encoded.
    #[instrument(skip(board))]
    pub fn new(
        board: Option<&Board>,
        winner: Option<String>,
        status: Option<RecordStatus>,
    ) -> Result<Self, DbError> {
        Ok(Self {
            board: board.map(serde_json::to_string).transpose()?,
            winner,
            status: status.map(|s| s.as_ref().to_string()),
            updated_at: chrono::Utc::now().naive_utc(),
        })
    }
}

/// One page of records, newest first.
#[derive(Debug, Clone, Getters, new)]
pub struct GamePage {
    records: Vec<GameRecord>,
    total: i64,
}

/// Counts across all stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameStats {
    total: i64,
    x_wins: i64,
    o_wins: i64,
    draws: i64,
    completed: i64,
}
