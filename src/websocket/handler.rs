use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::engine::{EngineOutput, UciProcess};
use crate::game::controller::GameController;
use crate::game::settings::Settings;
use crate::models::*;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// One browser session: its own board, clock and engine process
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub controller: GameController,
    ticker: Option<SpawnHandle>,
}

impl ChessWebSocket {
    pub fn new(id: String, app_state: web::Data<AppState>) -> Self {
        let settings = Settings::from_config(&app_state.config);
        ChessWebSocket {
            id,
            app_state,
            controller: GameController::new(settings),
            ticker: None,
        }
    }

    /// (Re)start the one-second clock tick. Any previous timer is cancelled first.
    pub fn arm_ticker(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.ticker.take() {
            ctx.cancel_future(handle);
        }
        let handle = ctx.run_interval(TICK_INTERVAL, |act, ctx| {
            if act.controller.tick().is_some() {
                if let Some(handle) = act.ticker.take() {
                    ctx.cancel_future(handle);
                }
            }
            act.flush(ctx);
        });
        self.ticker = Some(handle);
    }

    fn start_engine(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let path = self.app_state.config.engine.clone();
        match UciProcess::spawn(&path) {
            Ok((process, lines)) => {
                ctx.add_stream(lines);
                self.controller.attach_engine(Box::new(process));
            }
            Err(e) => {
                warn!("Could not start engine {}: {}", path, e);
                self.controller.engine_unavailable(&format!("could not start {}: {}", path, e));
            }
        }
    }

    pub fn send_message(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing message: {}", e),
        }
    }

    /// Push pending events, then the state they led to
    pub fn flush(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        for event in self.controller.drain_events() {
            self.send_message(&ServerMessage::Event { event }, ctx);
        }
        let snapshot = Box::new(self.controller.snapshot());
        self.send_message(&ServerMessage::State { snapshot }, ctx);
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let total_sessions = self.app_state.register(&self.id);
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        self.start_engine(ctx);
        self.arm_ticker(ctx);
        self.controller.new_game();
        self.flush(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.controller.shutdown_engine();
        let total_sessions = self.app_state.unregister(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
        Running::Stop
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        self.handle_message(client_msg, ctx);
                        self.flush(ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        let error = format!("Invalid message format: {}", e);
                        self.send_message(&ServerMessage::Error { error }, ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                let error = "Binary messages are not supported".to_string();
                self.send_message(&ServerMessage::Error { error }, ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

// Engine stdout
impl StreamHandler<EngineOutput> for ChessWebSocket {
    fn handle(&mut self, line: EngineOutput, ctx: &mut Self::Context) {
        if self.controller.handle_engine_line(&line.0) {
            self.flush(ctx);
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // The session outlives its engine
        warn!("Engine output closed for session {}", self.id);
        self.controller.engine_lost();
        self.flush(ctx);
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection request, id {}", id);
    ws::start(ChessWebSocket::new(id, app_state), &req, stream)
}
