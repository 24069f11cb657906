//! Precomputed content used when no assistant is configured or reachable.
//!
//! The table ships inside the binary (`data/static_table.yaml`) and carries
//! N/R/SR entries per category. UR and LR draws reuse the category's N entry;
//! their tier shows through the message prefixes and the high-usage line.

use crate::catalog::{Category, GenerationRequest, Rarity};
use crate::error::{GachaError, Result};
use crate::types::{Comparison, ContentRecord, Templates, Thresholds};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const TABLE_YAML: &str = include_str!("../data/static_table.yaml");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableEntry {
    comparisons: Vec<Comparison>,
    low_usage_messages: Vec<String>,
}

pub struct StaticTable {
    entries: BTreeMap<Category, BTreeMap<Rarity, TableEntry>>,
}

impl StaticTable {
    /// The table embedded in the binary, parsed once.
    pub fn embedded() -> Result<&'static StaticTable> {
        static TABLE: OnceLock<std::result::Result<StaticTable, String>> = OnceLock::new();
        TABLE
            .get_or_init(|| StaticTable::parse(TABLE_YAML).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| GachaError::StaticTable(e.clone()))
    }

    pub fn parse(yaml: &str) -> Result<StaticTable> {
        let entries = serde_yaml::from_str(yaml)?;
        Ok(StaticTable { entries })
    }

    /// Look up and tier-annotate the record for `request`.
    pub fn lookup<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        rng: &mut R,
    ) -> Result<ContentRecord> {
        let by_rarity = self
            .entries
            .get(&request.category)
            .ok_or_else(|| GachaError::UnknownSelector {
                kind: "category",
                id: request.category.to_string(),
            })?;
        let entry = by_rarity
            .get(&request.rarity)
            .or_else(|| by_rarity.get(&Rarity::N))
            .ok_or_else(|| GachaError::UnknownSelector {
                kind: "rarity",
                id: request.rarity.to_string(),
            })?;

        let mut record = ContentRecord {
            comparisons: entry.comparisons.clone(),
            low_usage_messages: entry.low_usage_messages.clone(),
            templates: Templates::standard(request.rarity.high_usage_message()),
            thresholds: Thresholds::default(),
        };
        annotate_by_rarity(&mut record, request.rarity, rng);
        record.sort_comparisons();
        Ok(record)
    }
}

/// Flavor prefixes for high-tier draws; one is picked per message.
pub fn tier_prefixes(rarity: Rarity) -> &'static [&'static str] {
    match rarity {
        Rarity::SR => &["[Good news] ", "Breaking: ", "✨ "],
        Rarity::UR => &["[Great news] ", "[Ultra rare] ", "⭐ "],
        Rarity::LR => &["[Legendary] ", "[Divine] ", "🌟 "],
        Rarity::N | Rarity::R => &[],
    }
}

fn annotate_by_rarity<R: Rng + ?Sized>(record: &mut ContentRecord, rarity: Rarity, rng: &mut R) {
    let prefixes = tier_prefixes(rarity);
    if prefixes.is_empty() {
        return;
    }
    for msg in &mut record.low_usage_messages {
        if let Some(prefix) = prefixes.choose(rng) {
            msg.insert_str(0, prefix);
        }
    }
}
