//! Single-slot request/response over a UCI link.
//!
//! At most one search is outstanding. A reply is matched to the slot by
//! arrival order: engine lines come back in the order the searches were
//! started, so cancelling a search only has to remember that its `bestmove`
//! (and any `info` before it) is still on the way and must be dropped.

use chess::{ChessMove, Color};
use log::{debug, info, warn};

use crate::engine::uci::{parse_line, EngineLine, Evaluation, UciCommand};
use crate::error::EngineError;

/// Outbound half of an engine connection
pub trait EngineLink {
    fn send(&mut self, command: &UciCommand) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPurpose {
    /// The reply is played for the automated side
    PlayMove,
    /// The reply is only displayed
    Analysis,
}

#[derive(Debug, Clone)]
struct PendingSearch {
    id: RequestId,
    purpose: SearchPurpose,
    fen: String,
    side_to_move: Color,
}

/// The resolution of the outstanding search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReply {
    pub id: RequestId,
    pub purpose: SearchPurpose,
    pub fen: String,
    pub best_move: Option<ChessMove>,
}

/// What a single engine line changed
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Ignored,
    Progress(Evaluation),
    Resolved(SearchReply),
}

pub struct EngineOrchestrator {
    link: Option<Box<dyn EngineLink>>,
    unavailable: Option<String>,
    pending: Option<PendingSearch>,
    stale_replies: usize,
    next_id: u64,
    evaluation: Option<Evaluation>,
}

impl Default for EngineOrchestrator {
    fn default() -> Self {
        Self::unavailable("no engine attached")
    }
}

impl EngineOrchestrator {
    pub fn unavailable(reason: &str) -> Self {
        EngineOrchestrator {
            link: None,
            unavailable: Some(reason.to_string()),
            pending: None,
            stale_replies: 0,
            next_id: 1,
            evaluation: None,
        }
    }

    /// Take over a freshly started engine and run the UCI handshake
    pub fn attach(&mut self, link: Box<dyn EngineLink>) -> Result<(), EngineError> {
        self.link = Some(link);
        self.unavailable = None;
        self.pending = None;
        self.stale_replies = 0;
        self.send(&UciCommand::Uci)?;
        self.send(&UciCommand::IsReady)
    }

    pub fn is_available(&self) -> bool {
        self.link.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_purpose(&self) -> Option<SearchPurpose> {
        self.pending.as_ref().map(|p| p.purpose)
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn clear_evaluation(&mut self) {
        self.evaluation = None;
    }

    /// Give up on the engine for the rest of the session
    pub fn mark_unavailable(&mut self, reason: &str) {
        if self.link.take().is_some() {
            warn!("Engine unavailable: {}", reason);
        }
        self.unavailable = Some(reason.to_string());
        self.pending = None;
        self.stale_replies = 0;
    }

    pub fn send(&mut self, command: &UciCommand) -> Result<(), EngineError> {
        let link = match self.link.as_mut() {
            Some(link) => link,
            None => {
                return Err(EngineError::Unavailable(
                    self.unavailable.clone().unwrap_or_default(),
                ))
            }
        };
        debug!("engine <- {}", command);
        if let Err(e) = link.send(command) {
            self.mark_unavailable(&e.to_string());
            return Err(EngineError::Unavailable(e.to_string()));
        }
        Ok(())
    }

    /// Start a search of `fen`. Refused while another search is outstanding.
    pub fn request(
        &mut self,
        purpose: SearchPurpose,
        fen: String,
        side_to_move: Color,
        depth: u8,
    ) -> Result<RequestId, EngineError> {
        if !self.is_available() {
            return Err(EngineError::Unavailable(self.unavailable.clone().unwrap_or_default()));
        }
        if self.pending.is_some() {
            return Err(EngineError::Busy);
        }

        self.send(&UciCommand::Position { fen: fen.clone() })?;
        self.send(&UciCommand::GoDepth(depth))?;

        let id = RequestId(self.next_id);
        self.next_id += 1;
        info!("Search {:?} ({:?}) started at depth {}", id, purpose, depth);
        self.pending = Some(PendingSearch { id, purpose, fen, side_to_move });
        Ok(id)
    }

    /// Drop the outstanding search; its reply will be discarded on arrival
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        info!("Search {:?} cancelled", pending.id);
        self.stale_replies += 1;
        // A failed stop marks the engine unavailable, which also clears the stale count
        let _ = self.send(&UciCommand::Stop);
        true
    }

    /// Feed one line of engine output
    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        match parse_line(line) {
            EngineLine::Info(search_info) => {
                if self.stale_replies > 0 {
                    return LineOutcome::Ignored;
                }
                let Some(pending) = self.pending.as_ref() else {
                    return LineOutcome::Ignored;
                };
                match Evaluation::from_info(&search_info, pending.side_to_move) {
                    Some(evaluation) => {
                        self.evaluation = Some(evaluation.clone());
                        LineOutcome::Progress(evaluation)
                    }
                    None => LineOutcome::Ignored,
                }
            }
            EngineLine::BestMove(best_move) => {
                if self.stale_replies > 0 {
                    self.stale_replies -= 1;
                    debug!("Dropped stale bestmove {:?}", best_move);
                    return LineOutcome::Ignored;
                }
                match self.pending.take() {
                    Some(pending) => LineOutcome::Resolved(SearchReply {
                        id: pending.id,
                        purpose: pending.purpose,
                        fen: pending.fen,
                        best_move,
                    }),
                    None => {
                        warn!("bestmove with no search outstanding");
                        LineOutcome::Ignored
                    }
                }
            }
            EngineLine::Other(text) => {
                debug!("engine -> {}", text);
                LineOutcome::Ignored
            }
        }
    }

    /// The engine's output ended. An outstanding search resolves with no move.
    pub fn disconnected(&mut self) -> Option<SearchReply> {
        let pending = self.pending.take();
        self.mark_unavailable("engine process exited");
        pending.map(|pending| SearchReply {
            id: pending.id,
            purpose: pending.purpose,
            fen: pending.fen,
            best_move: None,
        })
    }
}
