use serde::Serialize;

use crate::engine::Evaluation;

/// One board square in display order
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SquareView {
    pub square: String,
    pub glyph: Option<char>,
    pub light: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Highlight {
    pub square: String,
    pub capture: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PendingPromotionView {
    pub from: String,
    pub to: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClockView {
    pub white: String,
    pub black: String,
    pub white_seconds: u32,
    pub black_seconds: u32,
    pub increment_seconds: u32,
    pub running: bool,
    pub flagged: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EngineView {
    pub available: bool,
    pub thinking: bool,
    pub evaluation: Option<Evaluation>,
    pub unavailable_reason: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SettingsView {
    pub play_vs_ai: bool,
    pub ai_color: String,
    pub depth: u8,
    pub difficulty: String,
    pub time_preset: String,
}

/// Everything the browser needs to redraw after any change
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    /// Position at the view index
    pub fen: String,
    pub live_fen: String,
    pub squares: Vec<SquareView>,
    pub flipped: bool,
    pub mainline: Vec<String>,
    pub view_index: usize,
    pub live: bool,
    pub side_to_move: String,
    pub status: String,
    pub selected: Option<String>,
    pub highlights: Vec<Highlight>,
    pub pending_promotion: Option<PendingPromotionView>,
    pub clock: ClockView,
    pub engine: EngineView,
    pub settings: SettingsView,
}
