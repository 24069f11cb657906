//! `assistant-driver`: runs external assistant CLIs and recovers the JSON
//! they were asked to produce.
//!
//! # Architecture
//!
//! ```text
//! Invocation (command, args, stdin, timeout)
//!     │
//!     ▼
//! CommandRunner          ← trait; ProcessRunner is the tokio::process impl
//!     │
//!     ├── run_batch      ← stdin payload in, stdout/stderr out, SIGTERM on timeout
//!     │
//!     └── run_interactive
//!             │
//!             ▼
//!         InteractiveSession  ← pure state machine (Starting → AwaitingPrompt
//!             │                  → Streaming → Completed | Failed)
//!             ▼
//!         Transport           ← trait; ChildTransport over stdin/stdout
//!
//! JsonExtractor          ← fenced → anchored → incremental brace scan
//! ```
//!
//! Every path through a runner stops its timer and reaps its process before
//! returning: SIGTERM first, then a forced kill after [`KILL_GRACE`].

pub mod error;
pub mod extract;
pub mod process;
pub mod session;
pub mod transport;

pub use error::DriverError;
pub use extract::{IncrementalScanner, JsonExtractor, DEFAULT_MARKER};
pub use process::{BatchOutput, CommandRunner, Invocation, ProcessRunner, KILL_GRACE};
pub use session::{
    drive, InteractiveSession, Interaction, SessionAction, SessionEvent, SessionState,
};
pub use transport::{ChildTransport, Transport, Utf8Decoder};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, DriverError>;
