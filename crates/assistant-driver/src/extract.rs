//! Recover one JSON object from assistant output.
//!
//! Assistants wrap their answer in prose, markdown fences, echoed prompts and
//! trailing chatter. [`JsonExtractor::extract`] tries three strategies in
//! order and returns the first candidate that deserializes into the requested
//! type:
//!
//! 1. fenced blocks (```` ``` ```` with an optional language tag)
//! 2. the first balanced `{ … }` containing the marker key
//! 3. an incremental brace-balancing scan over the whole text
//!
//! A candidate that is valid JSON but the wrong shape is skipped, never
//! returned.

use crate::error::DriverError;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Key the anchored strategy looks for by default.
pub const DEFAULT_MARKER: &str = "\"comparisons\"";

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)```").unwrap())
}

// ─── JsonExtractor ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonExtractor {
    marker: String,
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self::with_marker(DEFAULT_MARKER)
    }
}

impl JsonExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor the second strategy on a different key, e.g. `"\"items\""`.
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn extract<T: DeserializeOwned>(&self, text: &str) -> Result<T, DriverError> {
        self.fenced(text)
            .or_else(|| self.anchored(text))
            .or_else(|| scan_lines(text))
            .ok_or(DriverError::NoStructuredContent)
    }

    /// Parse the whole trimmed text first when it already looks like a bare
    /// object, then fall back to [`extract`](Self::extract).
    pub fn extract_raw_first<T: DeserializeOwned>(&self, text: &str) -> Result<T, DriverError> {
        let trimmed = text.trim();
        if trimmed.starts_with('{') {
            if let Ok(v) = serde_json::from_str(trimmed) {
                return Ok(v);
            }
        }
        self.extract(text)
    }

    fn fenced<T: DeserializeOwned>(&self, text: &str) -> Option<T> {
        // Restart just past each opener so a closing fence can also open the
        // next block; nested or mismatched fences still get every pairing.
        let mut from = 0;
        while let Some(caps) = fence_re().captures_at(text, from) {
            let whole = caps.get(0)?;
            if let Some(body) = caps.get(1) {
                if let Ok(v) = serde_json::from_str(body.as_str().trim()) {
                    return Some(v);
                }
            }
            from = whole.start() + 3;
        }
        None
    }

    fn anchored<T: DeserializeOwned>(&self, text: &str) -> Option<T> {
        let last_marker = text.rfind(&self.marker)?;
        for (start, _) in text.match_indices('{') {
            if start > last_marker {
                break;
            }
            let Some(end) = balanced_end(text, start) else {
                continue;
            };
            let candidate = &text[start..end];
            if !candidate.contains(&self.marker) {
                continue;
            }
            if let Ok(v) = serde_json::from_str(candidate) {
                return Some(v);
            }
        }
        None
    }
}

fn scan_lines<T: DeserializeOwned>(text: &str) -> Option<T> {
    let mut scanner = IncrementalScanner::new();
    text.split_inclusive('\n')
        .find_map(|line| scanner.push_for::<T>(line))
}

/// Byte offset one past the `}` that closes the `{` at `start`.
///
/// Braces inside JSON strings are ignored. Works on bytes because every
/// delimiter involved is ASCII and never appears inside a multi-byte char.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in text.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

// ─── IncrementalScanner ───────────────────────────────────────────────────

/// Chunk-fed brace balancer.
///
/// Collection starts at the first `{` seen outside an object; every time the
/// depth returns to zero the collected text is handed back as a candidate and
/// the scanner resets, so a candidate that fails to parse is simply dropped.
#[derive(Debug, Default, Clone)]
pub struct IncrementalScanner {
    buf: String,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl IncrementalScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every top-level object it completed.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut done = Vec::new();
        for ch in chunk.chars() {
            if self.depth == 0 {
                if ch == '{' {
                    self.buf.clear();
                    self.buf.push(ch);
                    self.depth = 1;
                }
                continue;
            }

            self.buf.push(ch);
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }
            match ch {
                '"' => self.in_string = true,
                '{' => self.depth += 1,
                '}' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        done.push(std::mem::take(&mut self.buf));
                    }
                }
                _ => {}
            }
        }
        done
    }

    /// Feed a chunk and return the first completed object that fits `T`.
    pub fn push_for<T: DeserializeOwned>(&mut self, chunk: &str) -> Option<T> {
        self.push(chunk)
            .into_iter()
            .find_map(|candidate| serde_json::from_str(&candidate).ok())
    }
}
