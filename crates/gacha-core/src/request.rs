//! File-based request/response handshake with the status updater.
//!
//! Layout:
//!   .gacha-request.json   : `{category, rarity}` dropped by the updater
//!   .gacha-response.json  : the generated ContentRecord
//!
//! A request is deleted only after its response has been written atomically,
//! so a crash or a failed generation leaves it in place for the next pass.

use crate::catalog::GenerationRequest;
use crate::error::{GachaError, Result};
use crate::io;
use crate::paths;
use crate::types::ContentRecord;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct RawRequest {
    category: String,
    rarity: String,
}

/// A request file that has been read but not yet answered.
#[derive(Debug)]
pub struct PendingRequest {
    pub request: GenerationRequest,
    path: PathBuf,
}

impl PendingRequest {
    /// Read the request file, if one is waiting.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = paths::request_path(root);
        let data = match std::fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let raw: RawRequest = serde_json::from_str(&data).map_err(|e| {
            GachaError::InvalidInput(format!("{}: {e}", paths::REQUEST_FILE))
        })?;
        let request = GenerationRequest::from_ids(&raw.category, &raw.rarity)?;
        Ok(Some(Self { request, path }))
    }

    /// Write `record` as the response, then remove the request file.
    ///
    /// Consumes the request: once answered it cannot be answered again.
    pub fn respond(self, root: &Path, record: &ContentRecord) -> Result<PathBuf> {
        let response = paths::response_path(root);
        let data = serde_json::to_string_pretty(record)?;
        io::atomic_write(&response, data.as_bytes())?;
        io::remove_if_exists(&self.path)?;
        tracing::info!(request = %self.request, "answered gacha request");
        Ok(response)
    }
}
