//! Standard algebraic notation for `chess` boards, done by shakmaty.
//!
//! Moves cross between the two crates as UCI text: a `chess::Board` is loaded
//! into a shakmaty `Chess` position through its FEN, and the move found there
//! comes back through [`parse_uci_move`].

use chess::{Board, BoardStatus, ChessMove, Piece};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess};

use crate::engine::uci::parse_uci_move;

/// Load a FEN as a shakmaty position, rejecting malformed or impossible setups
pub fn position_from_fen(fen: &str) -> Option<Chess> {
    let fen: Fen = fen.trim().parse().ok()?;
    fen.into_position(CastlingMode::Standard).ok()
}

fn position_of(board: &Board) -> Option<Chess> {
    position_from_fen(&board.to_string())
}

pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    if board.piece_on(mv.get_dest()).is_some() {
        return true;
    }
    // En passant is the only pawn move that changes file onto an empty square
    board.piece_on(mv.get_source()) == Some(Piece::Pawn)
        && mv.get_source().get_file() != mv.get_dest().get_file()
}

/// Format a legal move in SAN, including `+` or `#`
pub fn to_san(board: &Board, mv: ChessMove) -> String {
    let san = position_of(board)
        .and_then(|pos| {
            let uci: UciMove = mv.to_string().parse().ok()?;
            let legal = uci.to_move(&pos).ok()?;
            Some(San::from_move(&pos, legal).to_string())
        })
        .unwrap_or_else(|| mv.to_string());

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        format!("{}#", san)
    } else if after.checkers().popcnt() > 0 {
        format!("{}+", san)
    } else {
        san
    }
}

/// Drop annotations and accept the common spelling variants of a SAN token
fn normalize(text: &str) -> String {
    let trimmed = text
        .trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
        .trim_end_matches("e.p.")
        .trim();
    let mut token = match trimmed {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    };
    // e8Q is read as e8=Q
    let bytes = token.as_bytes();
    if bytes.len() >= 3
        && matches!(bytes[bytes.len() - 1], b'Q' | b'R' | b'B' | b'N')
        && matches!(bytes[bytes.len() - 2], b'1' | b'8')
    {
        token.insert(token.len() - 1, '=');
    }
    token
}

/// Find the legal move a SAN token denotes
pub fn from_san(board: &Board, text: &str) -> Option<ChessMove> {
    let san: San = normalize(text).parse().ok()?;
    let pos = position_of(board)?;
    let legal = san.to_move(&pos).ok()?;
    parse_uci_move(&legal.to_uci(CastlingMode::Standard).to_string())
}
