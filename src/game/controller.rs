//! The session's application state and every operation that mutates it.
//!
//! `GameController` is driven by three kinds of trigger: a client message, a
//! one-second clock tick and a line of engine output. Each call runs to
//! completion and leaves history, view, clock and promotion state consistent,
//! so the caller can render a [`BoardSnapshot`] straight after.

use chess::{Board, ChessMove, Color, File, Piece, Rank, Square};
use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::{
    EngineLink, EngineOrchestrator, LineOutcome, RequestId, SearchPurpose, SearchReply, UciCommand,
};
use crate::error::{EngineError, MoveError, RecordError};
use crate::game::clock::{format_clock, ClockController, TimeForfeit, TimePreset};
use crate::game::history::GameHistory;
use crate::game::input::Selection;
use crate::game::promotion::PromotionGate;
use crate::game::rules::AppliedMove;
use crate::game::settings::{clamp_depth, Difficulty, Settings};
use crate::game::utils::{color_name, piece_glyph, status_text};
use crate::models::game_state::{
    BoardSnapshot, ClockView, EngineView, Highlight, PendingPromotionView, SettingsView, SquareView,
};

/// Something the client should be told about besides the new board state
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    MoveCommitted { san: String, ply: usize, by_engine: bool },
    MoveRejected { reason: String },
    PromotionRequired { from: String, to: String },
    TimeForfeit { side: String },
    GameOver { status: String, result: String },
    EngineUnavailable { reason: String },
    EngineBusy,
    Imported { plies: usize },
    ImportFailed { reason: String },
}

pub struct GameController {
    pub(crate) settings: Settings,
    pub(crate) history: GameHistory,
    pub(crate) clock: ClockController,
    pub(crate) promotion: PromotionGate,
    pub(crate) selection: Selection,
    engine: EngineOrchestrator,
    /// Engine move that arrived while the board showed an earlier position
    parked_reply: Option<SearchReply>,
    pub(crate) events: Vec<GameEvent>,
}

impl GameController {
    pub fn new(settings: Settings) -> Self {
        let clock = ClockController::new(settings.preset);
        GameController {
            settings,
            history: GameHistory::new(),
            clock,
            promotion: PromotionGate::default(),
            selection: Selection::default(),
            engine: EngineOrchestrator::default(),
            parked_reply: None,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    pub fn clock(&self) -> &ClockController {
        &self.clock
    }

    pub fn promotion(&self) -> &PromotionGate {
        &self.promotion
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn engine(&self) -> &EngineOrchestrator {
        &self.engine
    }

    pub fn is_live(&self) -> bool {
        self.history.is_live()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Engine lifecycle ----

    pub fn attach_engine(&mut self, link: Box<dyn EngineLink>) {
        match self.engine.attach(link) {
            Ok(()) => self.send_skill_level(),
            Err(e) => warn!("Engine handshake failed: {}", e),
        }
    }

    /// Record that no engine could be started; automated play becomes a no-op
    pub fn engine_unavailable(&mut self, reason: &str) {
        self.engine.mark_unavailable(reason);
    }

    /// Ask the engine to exit; the process is killed on drop regardless
    pub fn shutdown_engine(&mut self) {
        self.invalidate_search();
        if self.engine.is_available() {
            let _ = self.engine.send(&UciCommand::Quit);
        }
    }

    fn send_skill_level(&mut self) {
        let command = UciCommand::SetOption {
            name: "Skill Level".to_string(),
            value: self.settings.difficulty.skill_level().to_string(),
        };
        if let Err(e) = self.engine.send(&command) {
            debug!("Skill level not sent: {}", e);
        }
    }

    /// Drop any outstanding search and any engine move waiting for the live view
    fn invalidate_search(&mut self) {
        self.engine.cancel();
        self.parked_reply = None;
    }

    // ---- Game lifecycle ----

    pub fn new_game(&mut self) {
        self.invalidate_search();
        if self.engine.is_available() {
            let _ = self.engine.send(&UciCommand::NewGame);
        }
        self.engine.clear_evaluation();
        self.history.reset();
        self.promotion.dismiss();
        self.selection.clear();
        self.clock.apply_preset(self.settings.preset);
        info!("New game started");
        self.maybe_play_automated_move();
    }

    /// Commit a move on the live position and credit the mover's increment
    fn commit(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
        by_engine: bool,
    ) -> Result<AppliedMove, MoveError> {
        if let Some(side) = self.clock.flagged() {
            return Err(MoveError::TimeForfeited(color_name(side)));
        }
        let applied = self.history.commit_move(from, to, promotion)?;
        self.clock.apply_increment(applied.mover);
        info!("{} played {}", color_name(applied.mover), applied.san);
        self.events.push(GameEvent::MoveCommitted {
            san: applied.san.clone(),
            ply: self.history.len(),
            by_engine,
        });

        let record = self.history.record();
        let status = record.status();
        if status.is_terminal() {
            let turn = record.turn();
            info!("Game over: {:?}", status);
            self.events.push(GameEvent::GameOver {
                status: status_text(status, turn),
                result: status.result_token(turn).to_string(),
            });
        }
        Ok(applied)
    }

    pub(crate) fn commit_human(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<String, MoveError> {
        match self.commit(from, to, promotion, false) {
            Ok(applied) => {
                // Any analysis was of the previous position
                self.invalidate_search();
                self.maybe_play_automated_move();
                Ok(applied.san)
            }
            Err(e) => {
                warn!("Move rejected: {}", e);
                self.events.push(GameEvent::MoveRejected { reason: e.to_string() });
                Err(e)
            }
        }
    }

    /// Finish a suspended promotion with the chosen piece
    pub fn choose_promotion(&mut self, piece: Piece) -> Result<String, MoveError> {
        let (origin, destination) = self.promotion.take().ok_or(MoveError::NoPromotionPending)?;
        if !self.history.is_live() {
            return Err(MoveError::NotLive);
        }
        self.commit_human(origin, destination, Some(piece))
    }

    pub fn dismiss_promotion(&mut self) -> bool {
        self.promotion.dismiss()
    }

    /// Take back the last ply, or the last two when that returns the move to a
    /// human. Elapsed clock time is not given back.
    pub fn undo(&mut self) -> usize {
        if self.history.is_empty() {
            return 0;
        }
        self.invalidate_search();
        self.promotion.dismiss();
        self.selection.clear();
        let undone = self.history.undo_last_ply(self.settings.automated_side());
        info!("Took back {} plies", undone.len());
        // Only plays when the take-back emptied the game with the engine on move
        self.maybe_play_automated_move();
        undone.len()
    }

    pub fn import_pgn(&mut self, pgn: &str) -> Result<usize, RecordError> {
        match self.history.load_from_portable_record(pgn) {
            Ok(plies) => {
                self.invalidate_search();
                self.engine.clear_evaluation();
                self.promotion.dismiss();
                self.selection.clear();
                self.events.push(GameEvent::Imported { plies });
                self.maybe_play_automated_move();
                Ok(plies)
            }
            Err(e) => {
                warn!("PGN import failed: {}", e);
                self.events.push(GameEvent::ImportFailed { reason: e.to_string() });
                Err(e)
            }
        }
    }

    pub fn export_pgn(&self) -> String {
        self.history.record().export_pgn()
    }

    // ---- View navigation ----

    fn navigate(&mut self, index: usize) -> usize {
        self.selection.clear();
        if self.promotion.dismiss() {
            debug!("Promotion dismissed by navigation");
        }
        let index = self.history.set_view_index(index);
        if self.history.is_live() {
            self.resume_parked_reply();
        }
        index
    }

    pub fn set_view_index(&mut self, index: usize) -> usize {
        self.navigate(index)
    }

    pub fn to_start(&mut self) -> usize {
        self.navigate(0)
    }

    pub fn step_back(&mut self) -> usize {
        self.navigate(self.history.view_index().saturating_sub(1))
    }

    pub fn step_forward(&mut self) -> usize {
        self.navigate(self.history.view_index() + 1)
    }

    pub fn to_end(&mut self) -> usize {
        self.navigate(self.history.len())
    }

    // ---- Clock ----

    pub fn apply_time_preset(&mut self, preset: TimePreset) {
        self.settings.preset = preset;
        self.clock.apply_preset(preset);
        // A flag may have stopped the engine side; let it move again
        self.maybe_play_automated_move();
    }

    pub fn tick(&mut self) -> Option<TimeForfeit> {
        let record = self.history.record();
        let forfeit = self.clock.tick(record.turn(), record.is_game_over(), self.history.is_live())?;
        self.invalidate_search();
        self.events.push(GameEvent::TimeForfeit { side: forfeit.side.to_string() });
        Some(forfeit)
    }

    // ---- Engine ----

    /// Ask the engine for a move when it is the automated side's turn.
    /// A no-op while a move search is already outstanding.
    pub fn maybe_play_automated_move(&mut self) -> Option<RequestId> {
        let ai_color = self.settings.automated_side()?;
        let record = self.history.record();
        if record.is_game_over() || self.clock.flagged().is_some() || record.turn() != ai_color {
            return None;
        }
        if !self.history.is_live() {
            return None;
        }
        match self.engine.pending_purpose() {
            Some(SearchPurpose::PlayMove) => return None,
            Some(SearchPurpose::Analysis) => {
                self.engine.cancel();
            }
            None => {}
        }
        if !self.engine.is_available() {
            debug!("No engine, {} is not played automatically", color_name(ai_color));
            return None;
        }

        let record = self.history.record();
        let fen = record.position_notation();
        let turn = record.turn();
        match self.engine.request(SearchPurpose::PlayMove, fen, turn, self.settings.depth) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Engine move not requested: {}", e);
                None
            }
        }
    }

    /// Search the displayed position without playing the result
    pub fn analyze(&mut self) -> Result<RequestId, EngineError> {
        match self.engine.pending_purpose() {
            Some(SearchPurpose::PlayMove) => {
                self.events.push(GameEvent::EngineBusy);
                return Err(EngineError::Busy);
            }
            Some(SearchPurpose::Analysis) => {
                self.engine.cancel();
            }
            None => {}
        }

        let record = self.history.record();
        let view_index = self.history.view_index();
        let fen = record.fen_at(view_index).unwrap_or_else(|| record.position_notation());
        let side_to_move = record.board_at(view_index).unwrap_or_else(|| record.board()).side_to_move();

        self.engine
            .request(SearchPurpose::Analysis, fen, side_to_move, self.settings.depth)
            .map_err(|e| {
                warn!("Analysis unavailable: {}", e);
                if let EngineError::Unavailable(reason) = &e {
                    self.events.push(GameEvent::EngineUnavailable { reason: reason.clone() });
                }
                e
            })
    }

    /// Feed one line of engine stdout. Returns whether anything visible changed.
    pub fn handle_engine_line(&mut self, line: &str) -> bool {
        match self.engine.handle_line(line) {
            LineOutcome::Ignored => false,
            LineOutcome::Progress(_) => true,
            LineOutcome::Resolved(reply) => {
                self.on_search_reply(reply);
                true
            }
        }
    }

    /// The engine's output ended; it is unavailable from now on
    pub fn engine_lost(&mut self) {
        if let Some(reply) = self.engine.disconnected() {
            self.on_search_reply(reply);
        }
        self.events.push(GameEvent::EngineUnavailable {
            reason: self.engine.unavailable_reason().unwrap_or_default().to_string(),
        });
    }

    fn on_search_reply(&mut self, reply: SearchReply) {
        if reply.purpose == SearchPurpose::Analysis {
            info!("Analysis finished, best move {:?}", reply.best_move.map(|m| m.to_string()));
            return;
        }
        if reply.best_move.is_none() {
            info!("Engine has no move");
            return;
        }
        if reply.fen != self.history.record().position_notation() {
            warn!("Engine move for an old position dropped");
            return;
        }
        if !self.history.is_live() {
            debug!("Engine move parked until the live position is shown");
            self.parked_reply = Some(reply);
            return;
        }
        if let Some(best_move) = reply.best_move {
            self.play_engine_move(best_move);
        }
    }

    fn resume_parked_reply(&mut self) {
        if let Some(reply) = self.parked_reply.take() {
            self.on_search_reply(reply);
        }
    }

    fn play_engine_move(&mut self, best_move: ChessMove) {
        if self.settings.automated_side() != Some(self.history.record().turn()) {
            warn!("Engine move arrived when the engine is not on move");
            return;
        }
        match self.commit(best_move.get_source(), best_move.get_dest(), best_move.get_promotion(), true) {
            Ok(_) => self.selection.clear(),
            Err(e) => {
                warn!("Engine move {} rejected: {}", best_move, e);
                self.events.push(GameEvent::MoveRejected { reason: e.to_string() });
            }
        }
    }

    // ---- Settings ----

    fn automation_changed(&mut self) {
        if self.engine.pending_purpose() == Some(SearchPurpose::PlayMove) {
            self.engine.cancel();
        }
        self.parked_reply = None;
        self.selection.clear();
        self.maybe_play_automated_move();
    }

    pub fn set_play_vs_ai(&mut self, enabled: bool) {
        if self.settings.play_vs_ai != enabled {
            self.settings.play_vs_ai = enabled;
            self.automation_changed();
        }
    }

    pub fn set_ai_color(&mut self, color: Color) {
        if self.settings.ai_color != color {
            self.settings.ai_color = color;
            self.automation_changed();
        }
    }

    pub fn set_depth(&mut self, depth: u8) -> u8 {
        self.settings.depth = clamp_depth(depth);
        self.settings.depth
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
        self.settings.depth = difficulty.depth();
        self.send_skill_level();
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.settings.flipped = flipped;
    }

    // ---- Rendering ----

    pub fn snapshot(&self) -> BoardSnapshot {
        let record = self.history.record();
        let view_index = self.history.view_index();
        let board = self.history.view_position().unwrap_or_else(|e| {
            warn!("Falling back to the live position: {}", e);
            record.board()
        });

        BoardSnapshot {
            fen: record.fen_at(view_index).unwrap_or_else(|| board.to_string()),
            live_fen: record.position_notation(),
            squares: display_squares(&board, self.settings.flipped),
            flipped: self.settings.flipped,
            mainline: self.history.mainline().to_vec(),
            view_index,
            live: self.history.is_live(),
            side_to_move: color_name(board.side_to_move()).to_string(),
            status: status_text(record.status(), record.turn()),
            selected: self.selection.origin().map(|sq| sq.to_string()),
            highlights: self
                .selection
                .targets()
                .iter()
                .map(|d| Highlight { square: d.square.to_string(), capture: d.is_capture })
                .collect(),
            pending_promotion: self.promotion.pending().map(|(from, to)| PendingPromotionView {
                from: from.to_string(),
                to: to.to_string(),
            }),
            clock: ClockView {
                white: format_clock(self.clock.remaining(Color::White)),
                black: format_clock(self.clock.remaining(Color::Black)),
                white_seconds: self.clock.remaining(Color::White),
                black_seconds: self.clock.remaining(Color::Black),
                increment_seconds: self.clock.increment(),
                running: self.clock.is_running(),
                flagged: self.clock.flagged().map(|c| color_name(c).to_string()),
            },
            engine: EngineView {
                available: self.engine.is_available(),
                thinking: self.engine.is_busy(),
                evaluation: self.engine.evaluation().cloned(),
                unavailable_reason: self.engine.unavailable_reason().map(str::to_string),
            },
            settings: SettingsView {
                play_vs_ai: self.settings.play_vs_ai,
                ai_color: color_name(self.settings.ai_color).to_string(),
                depth: self.settings.depth,
                difficulty: self.settings.difficulty.as_str().to_string(),
                time_preset: self.settings.preset.to_string(),
            },
        }
    }
}

/// Squares top-left to bottom-right as seen by the viewer
fn display_squares(board: &Board, flipped: bool) -> Vec<SquareView> {
    let mut squares = Vec::with_capacity(64);
    for row in 0..8 {
        for col in 0..8 {
            let (rank, file) = if flipped { (row, 7 - col) } else { (7 - row, col) };
            let square = Square::make_square(Rank::from_index(rank), File::from_index(file));
            let glyph = board
                .piece_on(square)
                .zip(board.color_on(square))
                .map(|(piece, color)| piece_glyph(color, piece));
            squares.push(SquareView {
                square: square.to_string(),
                glyph,
                light: (rank + file) % 2 == 1,
            });
        }
    }
    squares
}
