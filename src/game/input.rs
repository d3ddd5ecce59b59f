//! Two-click move entry.

use chess::Square;
use log::debug;

use crate::error::MoveError;
use crate::game::controller::{GameController, GameEvent};
use crate::game::promotion::is_promotion_move;
use crate::game::rules::Destination;

/// The origin picked by a first click, with its legal destinations for highlighting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    origin: Option<Square>,
    targets: Vec<Destination>,
}

impl Selection {
    pub fn origin(&self) -> Option<Square> {
        self.origin
    }

    pub fn targets(&self) -> &[Destination] {
        &self.targets
    }

    pub fn clear(&mut self) {
        self.origin = None;
        self.targets.clear();
    }

    fn select(&mut self, origin: Square, targets: Vec<Destination>) {
        self.origin = Some(origin);
        self.targets = targets;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Ignored,
    OriginSelected(Vec<Destination>),
    AwaitingPromotion,
    Committed(String),
    Rejected(MoveError),
}

impl GameController {
    pub fn handle_square_selection(&mut self, square: Square) -> SelectionOutcome {
        if !self.history.is_live() {
            debug!("Click on {} ignored while reviewing", square);
            return SelectionOutcome::Ignored;
        }
        if self.promotion.is_pending() {
            return SelectionOutcome::Ignored;
        }

        let Some(origin) = self.selection.origin() else {
            return self.select_origin(square);
        };

        if origin == square {
            self.selection.clear();
            return SelectionOutcome::Ignored;
        }

        self.selection.clear();
        if is_promotion_move(&self.history.record().board(), origin, square) {
            self.promotion.open(origin, square);
            self.events.push(GameEvent::PromotionRequired {
                from: origin.to_string(),
                to: square.to_string(),
            });
            return SelectionOutcome::AwaitingPromotion;
        }

        match self.commit_human(origin, square, None) {
            Ok(san) => SelectionOutcome::Committed(san),
            Err(e) => SelectionOutcome::Rejected(e),
        }
    }

    fn select_origin(&mut self, square: Square) -> SelectionOutcome {
        let record = self.history.record();
        let Some((color, _)) = record.piece_at(square) else {
            return SelectionOutcome::Ignored;
        };
        if color != record.turn() || self.settings.automated_side() == Some(color) {
            return SelectionOutcome::Ignored;
        }

        let targets = record.moves_from(square);
        self.selection.select(square, targets.clone());
        SelectionOutcome::OriginSelected(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::settings::Settings;
    use chess::{Color, Piece};
    use std::str::FromStr;

    fn sq(text: &str) -> Square {
        Square::from_str(text).unwrap()
    }

    #[test]
    fn test_first_click_needs_own_piece() {
        let mut controller = GameController::new(Settings::default());
        assert_eq!(controller.handle_square_selection(sq("e4")), SelectionOutcome::Ignored);
        assert_eq!(controller.handle_square_selection(sq("e7")), SelectionOutcome::Ignored);

        match controller.handle_square_selection(sq("g1")) {
            SelectionOutcome::OriginSelected(targets) => {
                let squares: Vec<String> = targets.iter().map(|d| d.square.to_string()).collect();
                assert_eq!(squares.len(), 2);
                assert!(squares.contains(&"f3".to_string()));
                assert!(squares.contains(&"h3".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(controller.selection().origin(), Some(sq("g1")));
    }

    #[test]
    fn test_ai_seat_is_not_selectable() {
        let mut controller = GameController::new(Settings {
            play_vs_ai: true,
            ai_color: Color::White,
            ..Settings::default()
        });
        assert_eq!(controller.handle_square_selection(sq("e2")), SelectionOutcome::Ignored);
    }

    #[test]
    fn test_second_click_commits() {
        let mut controller = GameController::new(Settings::default());
        controller.handle_square_selection(sq("e2"));
        assert_eq!(
            controller.handle_square_selection(sq("e4")),
            SelectionOutcome::Committed("e4".to_string())
        );
        assert_eq!(controller.selection().origin(), None);
        assert_eq!(controller.history().mainline(), ["e4"]);
    }

    #[test]
    fn test_illegal_second_click_clears_selection() {
        let mut controller = GameController::new(Settings::default());
        controller.handle_square_selection(sq("e2"));
        match controller.handle_square_selection(sq("e5")) {
            SelectionOutcome::Rejected(MoveError::Illegal { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(controller.selection().origin(), None);
        assert!(controller.history().is_empty());
        assert!(controller
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::MoveRejected { .. })));
    }

    #[test]
    fn test_clicking_origin_again_deselects() {
        let mut controller = GameController::new(Settings::default());
        controller.handle_square_selection(sq("e2"));
        assert_eq!(controller.handle_square_selection(sq("e2")), SelectionOutcome::Ignored);
        assert_eq!(controller.selection().origin(), None);
    }

    #[test]
    fn test_clicks_ignored_in_review() {
        let mut controller = GameController::new(Settings::default());
        controller.handle_square_selection(sq("e2"));
        controller.handle_square_selection(sq("e4"));
        controller.step_back();
        assert_eq!(controller.handle_square_selection(sq("d2")), SelectionOutcome::Ignored);
    }

    #[test]
    fn test_promotion_waits_for_choice() {
        let mut controller = GameController::new(Settings::default());
        controller
            .import_pgn("[SetUp \"1\"]\n[FEN \"8/4P3/8/8/8/8/k7/4K3 w - - 0 1\"]\n\n*")
            .unwrap();
        controller.handle_square_selection(sq("e7"));
        assert_eq!(
            controller.handle_square_selection(sq("e8")),
            SelectionOutcome::AwaitingPromotion
        );
        assert!(controller.history().is_empty());
        // Other clicks are ignored until the choice is made
        assert_eq!(controller.handle_square_selection(sq("e1")), SelectionOutcome::Ignored);

        assert_eq!(controller.choose_promotion(Piece::Knight), Ok("e8=N".to_string()));
        assert_eq!(controller.history().mainline(), ["e8=N"]);
        assert!(!controller.promotion().is_pending());
    }

    #[test]
    fn test_dismissed_promotion_commits_nothing() {
        let mut controller = GameController::new(Settings::default());
        controller
            .import_pgn("[SetUp \"1\"]\n[FEN \"8/4P3/8/8/8/8/k7/4K3 w - - 0 1\"]\n\n*")
            .unwrap();
        controller.handle_square_selection(sq("e7"));
        controller.handle_square_selection(sq("e8"));
        assert!(controller.dismiss_promotion());
        assert!(controller.history().is_empty());
        assert!(controller.handle_square_selection(sq("e1")) != SelectionOutcome::Ignored);
    }
}
