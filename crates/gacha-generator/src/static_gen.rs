use crate::error::Result;
use crate::ContentGenerator;
use async_trait::async_trait;
use gacha_core::config::STATIC_VARIANT;
use gacha_core::static_table::StaticTable;
use gacha_core::{ContentRecord, GenerationRequest};

/// Serves the embedded table; never spawns a process.
pub struct StaticGenerator {
    table: &'static StaticTable,
}

impl StaticGenerator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            table: StaticTable::embedded()?,
        })
    }
}

#[async_trait]
impl ContentGenerator for StaticGenerator {
    fn name(&self) -> &str {
        STATIC_VARIANT
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ContentRecord> {
        let record = self.table.lookup(request, &mut rand::thread_rng())?;
        tracing::debug!(%request, "served static content");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_core::{Category, Rarity};

    #[tokio::test]
    async fn tech_normal_has_comparisons_and_all_templates() {
        let generator = StaticGenerator::new().unwrap();
        let record = generator
            .generate(&GenerationRequest::new(Category::Tech, Rarity::N))
            .await
            .unwrap();
        assert!(!record.comparisons.is_empty());
        let templates = serde_json::to_value(&record.templates).unwrap();
        for key in ["savingsComparison", "buffetMode", "lowUsage", "highUsageDefault"] {
            assert!(templates[key].as_str().is_some_and(|s| !s.is_empty()), "{key}");
        }
    }

    #[tokio::test]
    async fn ultra_rare_uses_tier_line() {
        let generator = StaticGenerator::new().unwrap();
        let record = generator
            .generate(&GenerationRequest::new(Category::Gadget, Rarity::UR))
            .await
            .unwrap();
        assert_eq!(record.templates.high_usage_default, Rarity::UR.high_usage_message());
    }
}
