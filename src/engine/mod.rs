pub mod orchestrator;
pub mod process;
pub mod uci;

pub use orchestrator::{EngineLink, EngineOrchestrator, LineOutcome, RequestId, SearchPurpose, SearchReply};
pub use process::{EngineOutput, UciProcess};
pub use uci::{Evaluation, UciCommand};
