//! UCI engine subprocess: commands go through a writer task, stdout comes
//! back as a stream of lines for the session actor.

use futures::stream::{self, LocalBoxStream, StreamExt};
use log::{info, warn};
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::engine::orchestrator::EngineLink;
use crate::engine::uci::UciCommand;
use crate::error::EngineError;

/// One line of engine stdout
#[derive(Debug, Clone)]
pub struct EngineOutput(pub String);

pub struct UciProcess {
    commands: mpsc::UnboundedSender<String>,
    // Dropping the child kills the engine
    _child: Child,
}

impl UciProcess {
    /// Start the engine binary. Must be called from within the actix runtime.
    pub fn spawn(path: &str) -> io::Result<(UciProcess, LocalBoxStream<'static, EngineOutput>)> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine stdout unavailable"))?;

        let (commands, mut queue) = mpsc::unbounded_channel::<String>();
        actix_rt::spawn(async move {
            while let Some(command) = queue.recv().await {
                let written = async {
                    stdin.write_all(command.as_bytes()).await?;
                    stdin.write_all(b"\n").await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    warn!("Failed to write to engine: {}", e);
                    break;
                }
            }
        });

        let lines = stream::unfold(BufReader::new(stdout).lines(), |mut lines| async move {
            match lines.next_line().await {
                Ok(Some(line)) => Some((EngineOutput(line), lines)),
                Ok(None) => None,
                Err(e) => {
                    warn!("Failed to read from engine: {}", e);
                    None
                }
            }
        })
        .boxed_local();

        info!("Started engine {}", path);
        Ok((UciProcess { commands, _child: child }, lines))
    }
}

impl EngineLink for UciProcess {
    fn send(&mut self, command: &UciCommand) -> Result<(), EngineError> {
        self.commands
            .send(command.to_string())
            .map_err(|_| EngineError::Disconnected)
    }
}
