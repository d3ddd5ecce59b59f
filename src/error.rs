use thiserror::Error;

/// Why a move request did not change the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Illegal move: {from}{to}")]
    Illegal { from: String, to: String },

    #[error("Game is already over")]
    GameOver,

    #[error("{0} ran out of time")]
    TimeForfeited(&'static str),

    #[error("Moves cannot be made while reviewing history")]
    NotLive,

    #[error("No promotion is pending")]
    NoPromotionPending,

    #[error("Invalid square: {0}")]
    InvalidSquare(String),
}

/// Failures while building a game record from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("PGN is empty")]
    Empty,

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Unknown or illegal move {token:?} at ply {ply}")]
    UnknownMove { ply: usize, token: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine is busy with another search")]
    Busy,

    #[error("Engine disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid time preset {0:?}, expected <seconds>|<increment>")]
    InvalidPreset(String),

    #[error("Unknown difficulty {0:?}")]
    InvalidDifficulty(String),

    #[error("Unknown color {0:?}")]
    InvalidColor(String),

    #[error("Unknown promotion piece {0:?}")]
    InvalidPiece(String),
}
