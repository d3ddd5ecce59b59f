use chess::{Board, Piece, Square};

use crate::game::rules::promotion_rank;

/// Whether moving `from` -> `to` would promote a pawn of the side to move.
/// Legality is left to the rules collaborator.
pub fn is_promotion_move(board: &Board, from: Square, to: Square) -> bool {
    let mover = board.side_to_move();
    board.piece_on(from) == Some(Piece::Pawn)
        && board.color_on(from) == Some(mover)
        && to.get_rank() == promotion_rank(mover)
}

/// Suspends a promoting move until a piece kind is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromotionGate {
    #[default]
    Idle,
    AwaitingChoice { origin: Square, destination: Square },
}

impl PromotionGate {
    pub fn is_pending(&self) -> bool {
        matches!(self, PromotionGate::AwaitingChoice { .. })
    }

    pub fn pending(&self) -> Option<(Square, Square)> {
        match *self {
            PromotionGate::AwaitingChoice { origin, destination } => Some((origin, destination)),
            PromotionGate::Idle => None,
        }
    }

    pub fn open(&mut self, origin: Square, destination: Square) {
        *self = PromotionGate::AwaitingChoice { origin, destination };
    }

    /// Leave `AwaitingChoice`, handing back the suspended move
    pub fn take(&mut self) -> Option<(Square, Square)> {
        let pending = self.pending();
        *self = PromotionGate::Idle;
        pending
    }

    pub fn dismiss(&mut self) -> bool {
        self.take().is_some()
    }
}
