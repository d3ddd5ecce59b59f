use serde::{Deserialize, Serialize};

use crate::game::controller::GameEvent;
use crate::models::game_state::BoardSnapshot;

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    SelectSquare { square: String },
    ChoosePromotion { piece: String },
    DismissPromotion,
    Undo,
    NewGame,
    GoTo { index: usize },
    ToStart,
    Back,
    Forward,
    ToEnd,
    ExportPgn,
    ImportPgn { pgn: String },
    Analyze,
    ApplyTimePreset { preset: String },
    SetPlayVsAi { enabled: bool },
    SetAiColor { color: String },
    SetDepth { depth: u8 },
    SetDifficulty { difficulty: String },
    SetFlipped { flipped: bool },
    Sync,
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ServerMessage {
    State { snapshot: Box<BoardSnapshot> },
    Event { event: GameEvent },
    Pgn { pgn: String },
    Error { error: String },
}
