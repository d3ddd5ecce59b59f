//! Move history and view cursor.
//!
//! `GameHistory` owns the authoritative `GameRecord` and a mirrored SAN
//! mainline, plus a view index that says how many plies are displayed.
//! Moving the view never touches the record: review positions are rebuilt by
//! [`project`], which replays a mainline prefix onto a scratch board.

use chess::{Board, Color, Piece, Square};
use log::{debug, info};

use crate::error::{MoveError, RecordError};
use crate::game::rules::{AppliedMove, GameRecord, MoveRequest};
use crate::game::notation::from_san;

/// Replay `moves` from `start` without touching any game record
pub fn project(start: &Board, moves: &[String]) -> Result<Board, RecordError> {
    moves.iter().enumerate().try_fold(*start, |board, (ply, san)| {
        from_san(&board, san)
            .map(|chess_move| board.make_move_new(chess_move))
            .ok_or_else(|| RecordError::UnknownMove { ply: ply + 1, token: san.clone() })
    })
}

#[derive(Debug, Clone, Default)]
pub struct GameHistory {
    record: GameRecord,
    mainline: Vec<String>,
    view_index: usize,
}

impl GameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn sync_to_live(&mut self) {
        self.mainline = self.record.history().to_vec();
        self.view_index = self.mainline.len();
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn mainline(&self) -> &[String] {
        &self.mainline
    }

    pub fn len(&self) -> usize {
        self.mainline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mainline.is_empty()
    }

    pub fn view_index(&self) -> usize {
        self.view_index
    }

    pub fn is_live(&self) -> bool {
        self.view_index == self.mainline.len()
    }

    /// Commit a move on the live position and jump the view to it
    pub fn commit_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<AppliedMove, MoveError> {
        let applied = self.record.apply_move(MoveRequest { from, to, promotion })?;
        self.sync_to_live();
        Ok(applied)
    }

    /// Take back the last ply. When `automated` names the side that is then to
    /// move, take back one more so a human is on move again.
    pub fn undo_last_ply(&mut self, automated: Option<Color>) -> Vec<AppliedMove> {
        let mut undone = Vec::new();
        if let Some(applied) = self.record.undo_last_move() {
            undone.push(applied);
            if automated == Some(self.record.turn()) {
                if let Some(applied) = self.record.undo_last_move() {
                    undone.push(applied);
                }
            }
        }
        self.sync_to_live();
        debug!("Undid {} plies, {} remain", undone.len(), self.mainline.len());
        undone
    }

    /// Clamp and set the number of displayed plies
    pub fn set_view_index(&mut self, index: usize) -> usize {
        self.view_index = index.min(self.mainline.len());
        self.view_index
    }

    pub fn to_start(&mut self) -> usize {
        self.set_view_index(0)
    }

    pub fn step_back(&mut self) -> usize {
        self.set_view_index(self.view_index.saturating_sub(1))
    }

    pub fn step_forward(&mut self) -> usize {
        self.set_view_index(self.view_index + 1)
    }

    pub fn to_end(&mut self) -> usize {
        self.set_view_index(self.mainline.len())
    }

    /// The displayed position, rebuilt from the starting position
    pub fn view_position(&self) -> Result<Board, RecordError> {
        project(&self.record.start_position(), &self.mainline[..self.view_index])
    }

    /// Replace the whole game from PGN; nothing changes on failure
    pub fn load_from_portable_record(&mut self, pgn: &str) -> Result<usize, RecordError> {
        self.record.import_pgn(pgn)?;
        self.sync_to_live();
        info!("Loaded {} plies from PGN", self.mainline.len());
        Ok(self.mainline.len())
    }

    pub fn reset(&mut self) {
        self.record = GameRecord::new();
        self.sync_to_live();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sq(text: &str) -> Square {
        Square::from_str(text).unwrap()
    }

    fn played(moves: &[(&str, &str)]) -> GameHistory {
        let mut history = GameHistory::new();
        for (from, to) in moves {
            history.commit_move(sq(from), sq(to), None).unwrap();
        }
        history
    }

    #[test]
    fn test_commit_jumps_to_live() {
        let mut history = played(&[("e2", "e4"), ("e7", "e5")]);
        history.set_view_index(0);
        assert!(!history.is_live());
        history.commit_move(sq("g1"), sq("f3"), None).unwrap();
        assert_eq!(history.mainline(), ["e4", "e5", "Nf3"]);
        assert_eq!(history.view_index(), 3);
    }

    #[test]
    fn test_rejected_commit_changes_nothing() {
        let mut history = played(&[("e2", "e4")]);
        history.set_view_index(0);
        assert!(history.commit_move(sq("e4"), sq("e5"), None).is_err());
        assert_eq!(history.mainline(), ["e4"]);
        assert_eq!(history.view_index(), 0);
    }

    #[test]
    fn test_view_index_is_clamped() {
        let mut history = played(&[("e2", "e4"), ("e7", "e5")]);
        assert_eq!(history.set_view_index(10), 2);
        assert_eq!(history.step_forward(), 2);
        assert_eq!(history.to_start(), 0);
        assert_eq!(history.step_back(), 0);
        assert_eq!(history.step_forward(), 1);
        assert_eq!(history.to_end(), 2);
    }

    #[test]
    fn test_projection_matches_record_and_leaves_it_alone() {
        let mut history = played(&[("d2", "d4"), ("g8", "f6"), ("c2", "c4"), ("e7", "e6")]);
        let live_fen = history.record().position_notation();
        for index in 0..=history.len() {
            history.set_view_index(index);
            let projected = history.view_position().unwrap();
            assert_eq!(Some(projected), history.record().board_at(index));
        }
        assert_eq!(history.record().position_notation(), live_fen);
        assert_eq!(history.record().len(), 4);
    }

    #[test]
    fn test_undo_is_left_inverse_of_commit() {
        let mut history = played(&[("e2", "e4"), ("c7", "c5")]);
        let before = history.mainline().to_vec();
        history.commit_move(sq("g1"), sq("f3"), None).unwrap();
        let undone = history.undo_last_ply(None);
        assert_eq!(undone.len(), 1);
        assert_eq!(history.mainline(), before.as_slice());
        assert_eq!(history.mainline().len(), history.record().history().len());
    }

    #[test]
    fn test_undo_skips_back_past_automated_side() {
        // Human white, engine black. Taking back white's Nf3 leaves white on
        // move, so only one ply goes
        let mut history = played(&[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
        assert_eq!(history.undo_last_ply(Some(Color::Black)).len(), 1);
        assert_eq!(history.mainline(), ["e4", "e5"]);
        // Taking back black's e5 leaves the engine on move, so take one more
        assert_eq!(history.undo_last_ply(Some(Color::Black)).len(), 2);
        assert!(history.is_empty());
        assert!(history.is_live());
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = GameHistory::new();
        assert!(history.undo_last_ply(Some(Color::White)).is_empty());
        assert_eq!(history.view_index(), 0);
    }

    #[test]
    fn test_load_failure_keeps_state() {
        let mut history = played(&[("e2", "e4")]);
        history.set_view_index(0);
        assert!(history.load_from_portable_record("1. e4 Qxf7").is_err());
        assert_eq!(history.mainline(), ["e4"]);
        assert_eq!(history.view_index(), 0);
    }
}
