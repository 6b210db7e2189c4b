//! Core domain types for a noughts match.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::Position;

/// A player's marker, also used as the turn indicator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Symbol {
    /// Symbol X (moves first).
    X,
    /// Symbol O (moves second).
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// How a finished match ended.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Winner {
    /// X completed a line.
    X,
    /// O completed a line.
    O,
    /// The board filled up without a line.
    #[serde(rename = "DRAW")]
    #[strum(serialize = "DRAW")]
    Draw,
}

impl Winner {
    /// Short human-readable result, e.g. `"X won"` or `"Draw"`.
    pub fn summary(self) -> String {
        match self {
            Winner::Draw => "Draw".to_string(),
            other => format!("{other} won"),
        }
    }
}

impl From<Symbol> for Winner {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::X => Winner::X,
            Symbol::O => Winner::O,
        }
    }
}

/// A single board cell.
///
/// On the wire a cell is one of the tokens `" "`, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Square {
    /// Nobody has played here.
    Empty,
    /// Taken by a symbol.
    Occupied(Symbol),
}

impl Square {
    /// Single-character wire token for this cell.
    pub fn token(self) -> &'static str {
        match self {
            Square::Empty => " ",
            Square::Occupied(Symbol::X) => "X",
            Square::Occupied(Symbol::O) => "O",
        }
    }
}

/// A board token that is not one of `" "`, `"X"`, `"O"`.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid board token: {:?}", token)]
pub struct TokenError {
    /// The offending token.
    #[error(not(source))]
    pub token: String,
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.token().to_string()
    }
}

impl TryFrom<String> for Square {
    type Error = TokenError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        match token.as_str() {
            " " => Ok(Square::Empty),
            "X" => Ok(Square::Occupied(Symbol::X)),
            "O" => Ok(Square::Occupied(Symbol::O)),
            _ => Err(TokenError { token }),
        }
    }
}

/// 3x3 board, row-major, index 0 top-left to 8 bottom-right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub(crate) fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// The nine wire tokens in board order.
    pub fn tokens(&self) -> [&'static str; 9] {
        self.squares.map(Square::token)
    }

    /// Formats the board as three text rows.
    pub fn display(&self) -> String {
        self.squares
            .chunks(3)
            .map(|row| {
                row.iter()
                    .map(|sq| match sq {
                        Square::Empty => ".",
                        other => other.token(),
                    })
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect::<Vec<_>>()
            .join("\n-+-+-\n")
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[Square; 9]> for Board {
    fn from(squares: [Square; 9]) -> Self {
        Self { squares }
    }
}
