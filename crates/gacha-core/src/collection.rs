//! Ledger of everything drawn so far.
//!
//! Layout:
//!   .gacha/collection.yaml  : obtained items plus running stats
//!   .gacha/results/*.json   : one saved ContentRecord per draw
//!
//! IDs are sequential and zero-padded: 001, 002, 003, …

use crate::catalog::{Category, GenerationRequest, Rarity};
use crate::error::Result;
use crate::io;
use crate::paths;
use crate::types::ContentRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObtainedItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub rarity: Rarity,
    pub obtained_at: DateTime<Utc>,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_draws: u64,
    #[serde(default)]
    pub by_rarity: BTreeMap<Rarity, u64>,
    #[serde(default)]
    pub by_category: BTreeMap<Category, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionLedger {
    #[serde(default)]
    pub obtained: Vec<ObtainedItem>,
    #[serde(default)]
    pub stats: CollectionStats,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl CollectionLedger {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::collection_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::collection_path(root), content.as_bytes())
    }

    /// Append a draw and bump the stats. Returns the new entry.
    pub fn record(
        &mut self,
        request: &GenerationRequest,
        file_name: impl Into<String>,
        at: DateTime<Utc>,
    ) -> &ObtainedItem {
        self.stats.total_draws += 1;
        *self.stats.by_rarity.entry(request.rarity).or_insert(0) += 1;
        *self.stats.by_category.entry(request.category).or_insert(0) += 1;

        let item = ObtainedItem {
            id: self.next_id(),
            name: request.theme_name(),
            category: request.category,
            rarity: request.rarity,
            obtained_at: at,
            file_name: file_name.into(),
        };
        self.obtained.push(item);
        &self.obtained[self.obtained.len() - 1]
    }

    /// The id the next recorded draw will get.
    pub fn next_id(&self) -> String {
        format!("{:03}", self.obtained.len() + 1)
    }

    /// Most recent draws first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ObtainedItem> {
        self.obtained.iter().rev().take(n)
    }

    pub fn count_for(&self, rarity: Rarity) -> u64 {
        self.stats.by_rarity.get(&rarity).copied().unwrap_or(0)
    }
}

/// `<category>_<rarity>_<timestamp>_<id>.json`, filesystem-safe.
///
/// The ledger id keeps two draws within the same second apart.
pub fn result_file_name(request: &GenerationRequest, id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}_{id}.json",
        request.category,
        request.rarity,
        at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Save a generated record under `.gacha/results/`, named for the draw the
/// ledger will record next. Returns the file name and path.
pub fn save_result(
    root: &Path,
    ledger: &CollectionLedger,
    request: &GenerationRequest,
    record: &ContentRecord,
    at: DateTime<Utc>,
) -> Result<(String, PathBuf)> {
    let file_name = result_file_name(request, &ledger.next_id(), at);
    let path = paths::result_path(root, &file_name);
    let data = serde_json::to_string_pretty(record)?;
    io::atomic_write(&path, data.as_bytes())?;
    Ok((file_name, path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
