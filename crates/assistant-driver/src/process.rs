use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};

use crate::extract::JsonExtractor;
use crate::session::{drive, Interaction, InteractiveSession};
use crate::transport::ChildTransport;
use crate::DriverError;

/// How long a process gets between SIGTERM and a forced kill.
pub const KILL_GRACE: Duration = Duration::from_secs(2);

// ─── Invocation ───────────────────────────────────────────────────────────

/// One external command run. Built per call, never persisted.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
    /// Written to stdin, which is then closed. `None` closes stdin at once.
    pub stdin: Option<String>,
    pub timeout: Duration,
    /// Remediation shown when `command` cannot be found.
    pub install_hint: Option<String>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
            install_hint: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    pub fn install_hint(mut self, hint: impl Into<String>) -> Self {
        self.install_hint = Some(hint.into());
        self
    }

    fn not_found(&self) -> DriverError {
        let hint = self.install_hint.clone().unwrap_or_else(|| {
            format!(
                "Install '{}' and make sure it is on PATH, or point the configuration at its full path.",
                self.command
            )
        });
        DriverError::ExecutableNotFound {
            command: self.command.clone(),
            hint,
        }
    }

    fn timed_out(&self) -> DriverError {
        DriverError::Timeout {
            command: self.command.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    fn spawn(&self) -> Result<Child, DriverError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.not_found()
            } else {
                DriverError::Io(e)
            }
        })
    }
}

/// Collected output of a batch run that exited zero.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub stdout: String,
    pub stderr: String,
}

// ─── CommandRunner ────────────────────────────────────────────────────────

/// Seam between generators and real processes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with all input supplied up front.
    async fn run_batch(&self, invocation: &Invocation) -> Result<BatchOutput, DriverError>;

    /// Converse with the process and return the first record carrying the
    /// interaction's required keys.
    async fn run_interactive(
        &self,
        invocation: &Invocation,
        interaction: &Interaction,
        extractor: &JsonExtractor,
    ) -> Result<Value, DriverError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    kill_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            kill_grace: KILL_GRACE,
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kill_grace(kill_grace: Duration) -> Self {
        Self { kill_grace }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run_batch(&self, inv: &Invocation) -> Result<BatchOutput, DriverError> {
        tracing::debug!(command = %inv.command, args = ?inv.args, "spawning batch process");
        let mut child = inv.spawn()?;

        let mut stdout_task = tokio::spawn(read_all(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_all(child.stderr.take()));

        let stdin = child.stdin.take();
        let payload = inv.stdin.clone();
        tokio::spawn(async move {
            if let (Some(mut pipe), Some(text)) = (stdin, payload) {
                // A tool that never reads stdin closes the pipe; that is not
                // our failure to report.
                let _ = pipe.write_all(text.as_bytes()).await;
                let _ = pipe.shutdown().await;
            }
        });

        // The deadline covers the pipes too: a helper the tool forked can
        // hold stdout open long after the tool itself exits.
        let finished = tokio::time::timeout(inv.timeout, async {
            let status = child.wait().await?;
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(done) => done?,
            Err(_) => {
                tracing::warn!(command = %inv.command, timeout_ms = inv.timeout.as_millis() as u64, "batch process timed out");
                terminate(&mut child, self.kill_grace).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(inv.timed_out());
            }
        };

        if !status.success() {
            return Err(DriverError::ProcessFailed {
                code: status.code(),
                stderr,
            });
        }
        Ok(BatchOutput { stdout, stderr })
    }

    async fn run_interactive(
        &self,
        inv: &Invocation,
        interaction: &Interaction,
        extractor: &JsonExtractor,
    ) -> Result<Value, DriverError> {
        tracing::debug!(command = %inv.command, args = ?inv.args, "spawning interactive process");
        let mut child = inv.spawn()?;
        let stderr_buf = drain_stderr(child.stderr.take());
        let mut transport = ChildTransport::new(child, stderr_buf, self.kill_grace);
        let session = InteractiveSession::new(interaction, extractor.clone());
        drive(&mut transport, session, interaction, &inv.command, inv.timeout).await
    }
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Drain stderr into a shared buffer on a background task.
fn drain_stderr(stderr: Option<ChildStderr>) -> Arc<Mutex<String>> {
    let buf = Arc::new(Mutex::new(String::new()));
    if let Some(stderr) = stderr {
        let sink = Arc::clone(&buf);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Ok(mut b) = sink.lock() {
                    if !b.is_empty() {
                        b.push('\n');
                    }
                    b.push_str(&line);
                }
            }
        });
    }
    buf
}

/// SIGTERM the child, then kill it if it is still running after `grace`.
/// Always reaps the child before returning.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }

    let signalled = match child.id() {
        Some(pid) => send_sigterm(pid).await,
        None => false,
    };

    if signalled {
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return;
        }
        tracing::warn!(pid = ?child.id(), "process ignored SIGTERM, killing");
    }
    let _ = child.kill().await;
}

#[cfg(unix)]
async fn send_sigterm(pid: u32) -> bool {
    Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
async fn send_sigterm(_pid: u32) -> bool {
    false
}
