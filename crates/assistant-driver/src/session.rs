//! Interactive-mode state machine.
//!
//! ```text
//!   Starting ──Spawned──▶ AwaitingPrompt ──Output(ready) / GraceElapsed──▶ Streaming
//!      │                        │                                            │
//!      │ (no readiness markers) │ Exited                          Output(record)│ Exited
//!      └──────────────▶ Streaming                                             ▼
//!                               └──────────────▶ final extraction ──▶ Completed | Failed
//! ```
//!
//! [`InteractiveSession`] is pure: it consumes [`SessionEvent`]s and answers
//! with a [`SessionAction`]. [`drive`] pumps events out of a [`Transport`]
//! and applies the actions, racing the deadline.

use crate::error::DriverError;
use crate::extract::{IncrementalScanner, JsonExtractor};
use crate::transport::Transport;
use serde_json::Value;
use std::time::Duration;

/// What an interactive run needs beyond the command itself.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub instruction: String,
    /// Substrings that mean the tool is waiting for input. Empty means the
    /// instruction is written as soon as the process starts.
    pub ready_markers: Vec<String>,
    /// How long to wait for a marker before writing the instruction anyway.
    pub grace: Duration,
    /// Top-level keys a streamed object must carry to end the run early.
    pub required_keys: Vec<String>,
    /// Close stdin after writing, for tools that only read until EOF.
    pub close_input_after_send: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    AwaitingPrompt,
    Streaming,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent<'a> {
    Spawned,
    Output(&'a str),
    GraceElapsed,
    Exited,
}

#[derive(Debug)]
pub enum SessionAction {
    Wait,
    SendInstruction,
    Finish(Value),
    Fail(DriverError),
}

// ─── InteractiveSession ───────────────────────────────────────────────────

#[derive(Debug)]
pub struct InteractiveSession {
    state: SessionState,
    ready_markers: Vec<String>,
    required_keys: Vec<String>,
    scanner: IncrementalScanner,
    extractor: JsonExtractor,
    transcript: String,
}

impl InteractiveSession {
    pub fn new(interaction: &Interaction, extractor: JsonExtractor) -> Self {
        Self {
            state: SessionState::Starting,
            ready_markers: interaction.ready_markers.clone(),
            required_keys: interaction.required_keys.clone(),
            scanner: IncrementalScanner::new(),
            extractor,
            transcript: String::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Everything the process printed so far.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn handle(&mut self, event: SessionEvent<'_>) -> SessionAction {
        use SessionEvent::*;
        use SessionState::*;

        if let Output(chunk) = event {
            self.transcript.push_str(chunk);
        }

        match (self.state, event) {
            (Starting, Spawned) => {
                if self.ready_markers.is_empty() {
                    self.state = Streaming;
                    SessionAction::SendInstruction
                } else {
                    self.state = AwaitingPrompt;
                    SessionAction::Wait
                }
            }
            (AwaitingPrompt, Output(chunk)) => {
                if self.is_ready(chunk) {
                    self.state = Streaming;
                    SessionAction::SendInstruction
                } else {
                    SessionAction::Wait
                }
            }
            (AwaitingPrompt, GraceElapsed) => {
                tracing::debug!("no prompt seen within grace period, sending instruction");
                self.state = Streaming;
                SessionAction::SendInstruction
            }
            (Streaming, Output(chunk)) => {
                let accepted = self
                    .scanner
                    .push(chunk)
                    .into_iter()
                    .filter_map(|c| serde_json::from_str::<Value>(&c).ok())
                    .find(|v| self.has_required_keys(v));
                match accepted {
                    Some(v) => {
                        self.state = Completed;
                        SessionAction::Finish(v)
                    }
                    None => SessionAction::Wait,
                }
            }
            (Starting | AwaitingPrompt | Streaming, Exited) => self.final_extraction(),
            // Late grace timers, output after completion and duplicate
            // events are ignored.
            _ => SessionAction::Wait,
        }
    }

    fn is_ready(&self, chunk: &str) -> bool {
        self.ready_markers.iter().any(|m| chunk.contains(m.as_str()))
    }

    fn has_required_keys(&self, v: &Value) -> bool {
        self.required_keys
            .iter()
            .all(|k| v.get(k).is_some_and(|field| !field.is_null()))
    }

    fn final_extraction(&mut self) -> SessionAction {
        match self.extractor.extract::<Value>(&self.transcript) {
            Ok(v) if self.has_required_keys(&v) => {
                self.state = SessionState::Completed;
                SessionAction::Finish(v)
            }
            _ => {
                self.state = SessionState::Failed;
                SessionAction::Fail(DriverError::NoStructuredContent)
            }
        }
    }
}

// ─── drive ────────────────────────────────────────────────────────────────

enum Step {
    Chunk(String),
    Eof,
    Grace,
    Deadline,
}

/// Run `session` against `transport` until it completes, fails or `timeout`
/// expires. The transport is terminated before returning on every path.
pub async fn drive<T: Transport + ?Sized>(
    transport: &mut T,
    mut session: InteractiveSession,
    interaction: &Interaction,
    command: &str,
    timeout: Duration,
) -> Result<Value, DriverError> {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let grace = tokio::time::sleep(interaction.grace);
    tokio::pin!(grace);
    let mut grace_pending = true;

    let mut action = session.handle(SessionEvent::Spawned);
    let outcome = loop {
        match action {
            SessionAction::Wait => {}
            SessionAction::SendInstruction => {
                let mut line = interaction.instruction.clone();
                line.push('\n');
                if let Err(e) = transport.send(&line).await {
                    break Err(e);
                }
                if interaction.close_input_after_send {
                    transport.close_input();
                }
            }
            SessionAction::Finish(v) => break Ok(v),
            SessionAction::Fail(e) => break Err(e),
        }

        let awaiting = session.state() == SessionState::AwaitingPrompt;
        let step = tokio::select! {
            _ = &mut deadline => Step::Deadline,
            _ = &mut grace, if grace_pending && awaiting => Step::Grace,
            chunk = transport.recv() => match chunk {
                Ok(Some(c)) => Step::Chunk(c),
                Ok(None) => Step::Eof,
                Err(e) => {
                    tracing::debug!(error = %e, "read from interactive process failed");
                    Step::Eof
                }
            },
        };

        action = match step {
            Step::Deadline => {
                break Err(DriverError::Timeout {
                    command: command.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            Step::Grace => {
                grace_pending = false;
                session.handle(SessionEvent::GraceElapsed)
            }
            Step::Chunk(c) => session.handle(SessionEvent::Output(&c)),
            Step::Eof => session.handle(SessionEvent::Exited),
        };
    };

    transport.terminate().await;
    outcome
}
