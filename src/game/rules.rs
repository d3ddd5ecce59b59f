use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square};
use log::debug;
use std::str::FromStr;

use crate::error::{MoveError, RecordError};
use crate::game::notation::{is_capture, position_from_fen, to_san};
use crate::game::utils::{has_insufficient_material, GameStatus};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A legal destination of a selected piece, used for highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub square: Square,
    pub is_capture: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

/// A move the record accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub chess_move: ChessMove,
    pub san: String,
    pub mover: Color,
}

/// The farthest rank from a side's own starting edge
pub fn promotion_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

/// The authoritative game: every position reached, plus the moves and SAN between them
#[derive(Debug, Clone)]
pub struct GameRecord {
    start_fen: Option<String>,
    start_fullmove: u32,
    positions: Vec<Board>,
    halfmove_clocks: Vec<u32>,
    moves: Vec<ChessMove>,
    sans: Vec<String>,
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRecord {
    pub fn new() -> Self {
        GameRecord {
            start_fen: None,
            start_fullmove: 1,
            positions: vec![Board::default()],
            halfmove_clocks: vec![0],
            moves: Vec::new(),
            sans: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, RecordError> {
        let fen = fen.trim();
        let invalid = || RecordError::InvalidFen(fen.to_string());
        // The `chess` parser accepts extra ranks and files, so check the setup first
        position_from_fen(fen).ok_or_else(invalid)?;
        let board = Board::from_str(fen).map_err(|_| invalid())?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove = fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0);
        let fullmove = fields.get(5).and_then(|f| f.parse().ok()).unwrap_or(1).max(1);

        Ok(GameRecord {
            start_fen: Some(fen.to_string()),
            start_fullmove: fullmove,
            positions: vec![board],
            halfmove_clocks: vec![halfmove],
            moves: Vec::new(),
            sans: Vec::new(),
        })
    }

    /// FEN the game started from, `None` for the standard position
    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn start_position(&self) -> Board {
        self.positions[0]
    }

    pub fn board(&self) -> Board {
        self.positions[self.positions.len() - 1]
    }

    pub fn board_at(&self, ply: usize) -> Option<Board> {
        self.positions.get(ply).copied()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn turn(&self) -> Color {
        self.board().side_to_move()
    }

    pub fn history(&self) -> &[String] {
        &self.sans
    }

    pub fn status(&self) -> GameStatus {
        let board = self.board();
        match board.status() {
            BoardStatus::Checkmate => return GameStatus::Checkmate,
            BoardStatus::Stalemate => return GameStatus::Stalemate,
            BoardStatus::Ongoing => {}
        }
        if has_insufficient_material(&board) {
            return GameStatus::InsufficientMaterial;
        }
        if self.halfmove_clocks[self.halfmove_clocks.len() - 1] >= 100 {
            return GameStatus::FiftyMoveRule;
        }
        let hash = board.get_hash();
        if self.positions.iter().filter(|b| b.get_hash() == hash).count() >= 3 {
            return GameStatus::ThreefoldRepetition;
        }
        if board.checkers().popcnt() > 0 {
            GameStatus::Check
        } else {
            GameStatus::InProgress
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn piece_at(&self, square: Square) -> Option<(Color, Piece)> {
        let board = self.board();
        Some((board.color_on(square)?, board.piece_on(square)?))
    }

    pub fn moves_from(&self, square: Square) -> Vec<Destination> {
        let board = self.board();
        let mut destinations: Vec<Destination> = Vec::new();
        for chess_move in MoveGen::new_legal(&board) {
            // Promotions appear once per piece kind, highlight the square once
            if chess_move.get_source() == square
                && !destinations.iter().any(|d| d.square == chess_move.get_dest())
            {
                destinations.push(Destination {
                    square: chess_move.get_dest(),
                    is_capture: is_capture(&board, chess_move),
                });
            }
        }
        destinations
    }

    /// Apply a move if it is legal. Pawn moves to the last rank promote to a
    /// queen unless another piece is requested.
    pub fn apply_move(&mut self, request: MoveRequest) -> Result<AppliedMove, MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }

        let board = self.board();
        let mover = board.side_to_move();
        let promotes = board.piece_on(request.from) == Some(Piece::Pawn)
            && board.color_on(request.from) == Some(mover)
            && request.to.get_rank() == promotion_rank(mover);
        let promotion = if promotes {
            Some(request.promotion.unwrap_or(Piece::Queen))
        } else {
            None
        };

        let chess_move = ChessMove::new(request.from, request.to, promotion);
        if !MoveGen::new_legal(&board).any(|m| m == chess_move) {
            return Err(MoveError::Illegal {
                from: request.from.to_string(),
                to: request.to.to_string(),
            });
        }

        let san = to_san(&board, chess_move);
        let resets_clock = board.piece_on(request.from) == Some(Piece::Pawn) || is_capture(&board, chess_move);
        let halfmove = if resets_clock {
            0
        } else {
            self.halfmove_clocks[self.halfmove_clocks.len() - 1] + 1
        };

        self.positions.push(board.make_move_new(chess_move));
        self.halfmove_clocks.push(halfmove);
        self.moves.push(chess_move);
        self.sans.push(san.clone());
        debug!("Applied {} ({})", san, chess_move);

        Ok(AppliedMove { chess_move, san, mover })
    }

    pub fn undo_last_move(&mut self) -> Option<AppliedMove> {
        let chess_move = self.moves.pop()?;
        let san = self.sans.pop().unwrap_or_default();
        self.positions.pop();
        self.halfmove_clocks.pop();
        Some(AppliedMove {
            chess_move,
            san,
            mover: self.turn(),
        })
    }

    /// FEN of the position after `ply` moves, with real move counters
    pub fn fen_at(&self, ply: usize) -> Option<String> {
        let board = self.positions.get(ply)?;
        let placement = board.to_string();
        let fields: Vec<&str> = placement.split_whitespace().take(4).collect();
        let black_started = self.positions[0].side_to_move() == Color::Black;
        let fullmove = self.start_fullmove as usize + (ply + usize::from(black_started)) / 2;
        Some(format!("{} {} {}", fields.join(" "), self.halfmove_clocks[ply], fullmove))
    }

    /// FEN of the live position
    pub fn position_notation(&self) -> String {
        self.fen_at(self.len()).unwrap_or_else(|| START_FEN.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(text: &str) -> Square {
        Square::from_str(text).unwrap()
    }

    fn request(from: &str, to: &str) -> MoveRequest {
        MoveRequest { from: sq(from), to: sq(to), promotion: None }
    }

    #[test]
    fn test_apply_and_undo() {
        let mut record = GameRecord::new();
        let applied = record.apply_move(request("e2", "e4")).unwrap();
        assert_eq!(applied.san, "e4");
        assert_eq!(applied.mover, Color::White);
        assert_eq!(record.history(), ["e4"]);
        assert_eq!(record.turn(), Color::Black);

        let undone = record.undo_last_move().unwrap();
        assert_eq!(undone.san, "e4");
        assert_eq!(undone.mover, Color::White);
        assert!(record.is_empty());
        assert_eq!(record.position_notation(), START_FEN);
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut record = GameRecord::new();
        let err = record.apply_move(request("e2", "e5")).unwrap_err();
        assert_eq!(err, MoveError::Illegal { from: "e2".into(), to: "e5".into() });
        assert!(record.is_empty());
        assert_eq!(record.undo_last_move(), None);
    }

    #[test]
    fn test_fen_counters() {
        let mut record = GameRecord::new();
        record.apply_move(request("g1", "f3")).unwrap();
        record.apply_move(request("g8", "f6")).unwrap();
        assert_eq!(
            record.position_notation(),
            "rnbqkb1r/pppppppp/5n2/8/8/5N2/PPPPPPPP/RNBQKB1R w KQkq - 2 2"
        );
    }

    #[test]
    fn test_from_fen_rejects_malformed_setups() {
        for fen in [
            "8/8/8/8/8/8/8/8/8/4K2k w - - 0 1",
            "8/8/8/8/8/8/8/4K2k1 w - - 0 1",
            "8/8/8/8/8/8/8 w - - 0 1",
            "8/8/8/8/8/8/8/4K2k z - - 0 1",
            "8/8/8/8/8/8/8/4K2k w Zq - 0 1",
            "8/8/8/8/8/8/8/4K2k w - - x 1",
        ] {
            assert_eq!(GameRecord::from_fen(fen).unwrap_err(), RecordError::InvalidFen(fen.to_string()));
        }
        let record = GameRecord::from_fen(" 8/8/8/8/8/8/8/4K2k b - - 3 40 ").unwrap();
        assert_eq!(record.turn(), Color::Black);
        assert_eq!(record.start_fen(), Some("8/8/8/8/8/8/8/4K2k b - - 3 40"));
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut record = GameRecord::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let applied = record.apply_move(request("e7", "e8")).unwrap();
        assert_eq!(applied.chess_move.get_promotion(), Some(Piece::Queen));
        assert_eq!(applied.san, "e8=Q");
    }

    #[test]
    fn test_moves_from_marks_captures() {
        let mut record = GameRecord::new();
        record.apply_move(request("e2", "e4")).unwrap();
        record.apply_move(request("d7", "d5")).unwrap();
        let destinations = record.moves_from(sq("e4"));
        assert_eq!(destinations.len(), 2);
        assert!(destinations.contains(&Destination { square: sq("d5"), is_capture: true }));
        assert!(destinations.contains(&Destination { square: sq("e5"), is_capture: false }));
    }

    #[test]
    fn test_checkmate_ends_the_game() {
        let mut record = GameRecord::new();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            record.apply_move(request(from, to)).unwrap();
        }
        assert_eq!(record.status(), GameStatus::Checkmate);
        assert!(record.is_game_over());
        assert_eq!(record.apply_move(request("a2", "a3")), Err(MoveError::GameOver));
    }

    #[test]
    fn test_threefold_repetition() {
        let mut record = GameRecord::new();
        for _ in 0..2 {
            for (from, to) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
                record.apply_move(request(from, to)).unwrap();
            }
        }
        assert_eq!(record.status(), GameStatus::ThreefoldRepetition);
    }
}
