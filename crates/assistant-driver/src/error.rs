use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("executable '{command}' not found\n\n{hint}")]
    ExecutableNotFound { command: String, hint: String },

    #[error("'{command}' timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("process exited with {}: {stderr}", describe_exit(.code))]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("no structured content found in output")]
    NoStructuredContent,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

impl DriverError {
    /// Text a caller can search for tool-specific rejection messages.
    pub fn diagnostic(&self) -> &str {
        match self {
            DriverError::ProcessFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}
