use actix_web_actors::ws;
use log::{info, warn};

use crate::game::clock::TimePreset;
use crate::game::settings::Difficulty;
use crate::game::utils::{parse_color, parse_promotion_piece, parse_square};
use crate::models::messages::{ClientMessage, ServerMessage};
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    /// Apply one client action to the session. The caller flushes events and state.
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::SelectSquare { square } => self.handle_select_square(&square, ctx),
            ClientMessage::ChoosePromotion { piece } => self.handle_choose_promotion(&piece, ctx),
            ClientMessage::DismissPromotion => {
                self.controller.dismiss_promotion();
            }
            ClientMessage::Undo => {
                self.controller.undo();
            }
            ClientMessage::NewGame => {
                self.controller.new_game();
                self.arm_ticker(ctx);
            }
            ClientMessage::GoTo { index } => {
                self.controller.set_view_index(index);
            }
            ClientMessage::ToStart => {
                self.controller.to_start();
            }
            ClientMessage::Back => {
                self.controller.step_back();
            }
            ClientMessage::Forward => {
                self.controller.step_forward();
            }
            ClientMessage::ToEnd => {
                self.controller.to_end();
            }
            ClientMessage::ExportPgn => {
                let pgn = self.controller.export_pgn();
                self.send_message(&ServerMessage::Pgn { pgn }, ctx);
            }
            ClientMessage::ImportPgn { pgn } => {
                // Failures are reported through the import_failed event
                if let Ok(plies) = self.controller.import_pgn(&pgn) {
                    info!("Session {} imported {} plies", self.id, plies);
                }
            }
            ClientMessage::Analyze => {
                // Busy and unavailable are reported as events
                let _ = self.controller.analyze();
            }
            ClientMessage::ApplyTimePreset { preset } => self.handle_time_preset(&preset, ctx),
            ClientMessage::SetPlayVsAi { enabled } => self.controller.set_play_vs_ai(enabled),
            ClientMessage::SetAiColor { color } => match parse_color(&color) {
                Ok(color) => self.controller.set_ai_color(color),
                Err(e) => self.send_error(e.to_string(), ctx),
            },
            ClientMessage::SetDepth { depth } => {
                self.controller.set_depth(depth);
            }
            ClientMessage::SetDifficulty { difficulty } => match difficulty.parse::<Difficulty>() {
                Ok(difficulty) => self.controller.set_difficulty(difficulty),
                Err(e) => self.send_error(e.to_string(), ctx),
            },
            ClientMessage::SetFlipped { flipped } => self.controller.set_flipped(flipped),
            ClientMessage::Sync => {}
        }
    }

    fn send_error(&self, error: String, ctx: &mut ws::WebsocketContext<Self>) {
        warn!("Session {}: {}", self.id, error);
        self.send_message(&ServerMessage::Error { error }, ctx);
    }

    fn handle_select_square(&mut self, square: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match parse_square(square) {
            Ok(square) => {
                self.controller.handle_square_selection(square);
            }
            Err(e) => self.send_error(e.to_string(), ctx),
        }
    }

    fn handle_choose_promotion(&mut self, piece: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let piece = match parse_promotion_piece(piece) {
            Ok(piece) => piece,
            Err(e) => return self.send_error(e.to_string(), ctx),
        };
        // An illegal promotion is reported as move_rejected by the controller
        if let Err(e) = self.controller.choose_promotion(piece) {
            info!("Promotion not played: {}", e);
        }
    }

    fn handle_time_preset(&mut self, preset: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match preset.parse::<TimePreset>() {
            Ok(preset) => {
                self.controller.apply_time_preset(preset);
                self.arm_ticker(ctx);
            }
            Err(e) => self.send_error(e.to_string(), ctx),
        }
    }
}
