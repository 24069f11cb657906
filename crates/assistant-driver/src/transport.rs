use crate::error::DriverError;
use crate::process::terminate;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout};

/// Bidirectional text channel to a running interactive tool.
#[async_trait]
pub trait Transport: Send {
    /// Next decoded stdout chunk, `None` once output is closed.
    async fn recv(&mut self) -> Result<Option<String>, DriverError>;

    async fn send(&mut self, text: &str) -> Result<(), DriverError>;

    /// Signal end of input. Idempotent.
    fn close_input(&mut self);

    /// Stop the tool and reap it. Idempotent.
    async fn terminate(&mut self);
}

// ─── Utf8Decoder ──────────────────────────────────────────────────────────

/// Decodes a byte stream whose reads may split multi-byte characters.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, holding back an incomplete trailing sequence for the
    /// next call. Invalid sequences become U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let keep_from = incomplete_tail_start(&self.pending);
        let tail = self.pending.split_off(keep_from);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        text
    }

    /// Flush whatever is held back, lossily.
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Index where a truncated multi-byte sequence starts at the end of `b`, or
/// `b.len()` if the buffer ends on a character boundary.
fn incomplete_tail_start(b: &[u8]) -> usize {
    for back in 1..=b.len().min(3) {
        let i = b.len() - back;
        let byte = b[i];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let need = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if need > back { i } else { b.len() };
    }
    b.len()
}

// ─── ChildTransport ───────────────────────────────────────────────────────

/// [`Transport`] over a spawned child's stdin/stdout.
pub struct ChildTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    decoder: Utf8Decoder,
    buf: Vec<u8>,
    stderr: Arc<Mutex<String>>,
    kill_grace: Duration,
}

impl ChildTransport {
    pub(crate) fn new(
        mut child: Child,
        stderr: Arc<Mutex<String>>,
        kill_grace: Duration,
    ) -> Self {
        Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            child,
            decoder: Utf8Decoder::new(),
            buf: vec![0u8; 8192],
            stderr,
            kill_grace,
        }
    }

    /// Stderr collected so far.
    pub fn stderr(&self) -> String {
        self.stderr.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ChildTransport {
    async fn recv(&mut self) -> Result<Option<String>, DriverError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        loop {
            let n = stdout.read(&mut self.buf).await?;
            if n == 0 {
                self.stdout = None;
                let rest = self.decoder.finish();
                return Ok(if rest.is_empty() { None } else { Some(rest) });
            }
            let text = self.decoder.decode(&self.buf[..n]);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), DriverError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            DriverError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin already closed",
            ))
        })?;
        stdin.write_all(text.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    fn close_input(&mut self) {
        self.stdin.take();
    }

    async fn terminate(&mut self) {
        self.stdin.take();
        terminate(&mut self.child, self.kill_grace).await;
        let stderr = self.stderr();
        if !stderr.is_empty() {
            tracing::debug!(stderr = %stderr, "interactive process stderr");
        }
    }
}
