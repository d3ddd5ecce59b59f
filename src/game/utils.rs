use chess::{Board, Color, Piece, Square};
use serde::Serialize;
use std::str::FromStr;

use crate::error::{ConfigError, MoveError};

/// Convert a chess color to its lowercase name
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Parse "white"/"black" (or "w"/"b")
pub fn parse_color(text: &str) -> Result<Color, ConfigError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        _ => Err(ConfigError::InvalidColor(text.to_string())),
    }
}

pub fn parse_square(text: &str) -> Result<Square, MoveError> {
    Square::from_str(text.trim()).map_err(|_| MoveError::InvalidSquare(text.to_string()))
}

/// Parse a promotion choice: q, r, b or n (case-insensitive, full names allowed)
pub fn parse_promotion_piece(text: &str) -> Result<Piece, ConfigError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "q" | "queen" => Ok(Piece::Queen),
        "r" | "rook" => Ok(Piece::Rook),
        "b" | "bishop" => Ok(Piece::Bishop),
        "n" | "knight" => Ok(Piece::Knight),
        _ => Err(ConfigError::InvalidPiece(text.to_string())),
    }
}

/// Uppercase SAN letter for a piece, pawns have none
pub fn piece_letter(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "",
        Piece::Knight => "N",
        Piece::Bishop => "B",
        Piece::Rook => "R",
        Piece::Queen => "Q",
        Piece::King => "K",
    }
}

pub fn piece_glyph(color: Color, piece: Piece) -> char {
    match (color, piece) {
        (Color::White, Piece::King) => '♔',
        (Color::White, Piece::Queen) => '♕',
        (Color::White, Piece::Rook) => '♖',
        (Color::White, Piece::Bishop) => '♗',
        (Color::White, Piece::Knight) => '♘',
        (Color::White, Piece::Pawn) => '♙',
        (Color::Black, Piece::King) => '♚',
        (Color::Black, Piece::Queen) => '♛',
        (Color::Black, Piece::Rook) => '♜',
        (Color::Black, Piece::Bishop) => '♝',
        (Color::Black, Piece::Knight) => '♞',
        (Color::Black, Piece::Pawn) => '♟',
    }
}

/// State of the live position as reported by the rules collaborator
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress | GameStatus::Check)
    }

    /// PGN result token; `turn` is the side to move in the final position
    pub fn result_token(self, turn: Color) -> &'static str {
        match self {
            GameStatus::Checkmate => match turn {
                Color::White => "0-1",
                Color::Black => "1-0",
            },
            GameStatus::InProgress | GameStatus::Check => "*",
            _ => "1/2-1/2",
        }
    }
}

/// Get the game status as a string for the client
pub fn status_text(status: GameStatus, turn: Color) -> String {
    match status {
        GameStatus::Checkmate => match turn {
            Color::White => "black_wins".to_string(),
            Color::Black => "white_wins".to_string(),
        },
        GameStatus::Stalemate => "stalemate".to_string(),
        GameStatus::InsufficientMaterial
        | GameStatus::FiftyMoveRule
        | GameStatus::ThreefoldRepetition => "draw".to_string(),
        GameStatus::Check => "check".to_string(),
        GameStatus::InProgress => format!("{}_turn", color_name(turn)),
    }
}

/// Light squares have an odd rank + file sum (h1 is light)
fn is_light_square(square: Square) -> bool {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 1
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }

    let knights = board.pieces(Piece::Knight).popcnt();
    let bishops = *board.pieces(Piece::Bishop);

    // King vs King, or King and one minor piece vs King
    if knights + bishops.popcnt() <= 1 {
        return true;
    }

    // King and Bishop vs King and Bishop with both bishops on the same color
    if knights == 0 && bishops.popcnt() == 2 {
        let white_bishops = (bishops & *board.color_combined(Color::White)).popcnt();
        if white_bishops == 1 {
            let shades: Vec<bool> = bishops.map(is_light_square).collect();
            return shades[0] == shades[1];
        }
    }

    false
}
