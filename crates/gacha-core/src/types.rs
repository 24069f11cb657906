use crate::error::{GachaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// One "this month's spend is worth X" line. Serialized as `{"usd", "item"}`
/// because that is what downstream status templating consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(rename = "usd")]
    pub threshold_usd: f64,
    #[serde(rename = "item")]
    pub label: String,
}

impl Comparison {
    pub fn new(threshold_usd: f64, label: impl Into<String>) -> Self {
        Self {
            threshold_usd,
            label: label.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Templates / Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Templates {
    pub savings_comparison: String,
    pub buffet_mode: String,
    pub low_usage: String,
    pub high_usage_default: String,
    /// Any additional named templates an assistant chose to emit.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Templates {
    /// The stock template set; `high_usage_default` varies by rarity tier.
    pub fn standard(high_usage_default: impl Into<String>) -> Self {
        Self {
            savings_comparison: "This month you saved about {item} (total: {totalCost}, saved: {savings})"
                .to_string(),
            buffet_mode: "All-you-can-eat Claude Max ({totalCost})".to_string(),
            low_usage: "{message} ({totalCost})".to_string(),
            high_usage_default: high_usage_default.into(),
            extra: BTreeMap::new(),
        }
    }

    fn required(&self) -> [(&'static str, &str); 4] {
        [
            ("savingsComparison", &self.savings_comparison),
            ("buffetMode", &self.buffet_mode),
            ("lowUsage", &self.low_usage),
            ("highUsageDefault", &self.high_usage_default),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub savings_comparison_min: f64,
    pub buffet_mode_min: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            savings_comparison_min: 12.0,
            buffet_mode_min: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ContentRecord
// ---------------------------------------------------------------------------

/// The structured flavor-text payload consumed by status templating.
///
/// Deserialization already rejects a record that is missing any of the four
/// required template keys or either threshold; [`ContentRecord::validate`]
/// enforces the non-emptiness rules serde cannot express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub comparisons: Vec<Comparison>,
    pub low_usage_messages: Vec<String>,
    pub templates: Templates,
    pub thresholds: Thresholds,
}

impl ContentRecord {
    pub fn validate(&self) -> Result<()> {
        if self.comparisons.is_empty() {
            return Err(GachaError::InvalidRecord("comparisons is empty".into()));
        }
        if let Some(c) = self.comparisons.iter().find(|c| !c.threshold_usd.is_finite()) {
            return Err(GachaError::InvalidRecord(format!(
                "comparison '{}' has a non-finite usd value",
                c.label
            )));
        }
        if self.low_usage_messages.is_empty() {
            return Err(GachaError::InvalidRecord(
                "lowUsageMessages is empty".into(),
            ));
        }
        for (key, value) in self.templates.required() {
            if value.trim().is_empty() {
                return Err(GachaError::InvalidRecord(format!(
                    "template '{key}' is empty"
                )));
            }
        }
        let t = &self.thresholds;
        if !t.savings_comparison_min.is_finite() || !t.buffet_mode_min.is_finite() {
            return Err(GachaError::InvalidRecord(
                "thresholds must be finite numbers".into(),
            ));
        }
        Ok(())
    }

    /// Stable-sort comparisons ascending by `usd`; equal prices keep their order.
    pub fn sort_comparisons(&mut self) {
        self.comparisons
            .sort_by(|a, b| a.threshold_usd.total_cmp(&b.threshold_usd));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
