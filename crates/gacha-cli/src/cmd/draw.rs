use crate::output::print_json;
use anyhow::Context;
use chrono::Utc;
use gacha_core::collection::{self, CollectionLedger};
use gacha_core::GenerationRequest;
use std::path::Path;

pub fn run(root: &Path, generator: Option<&str>, json: bool) -> anyhow::Result<()> {
    super::require_init(root)?;

    let request = GenerationRequest::draw(&mut rand::thread_rng());
    tracing::debug!(%request, "drew");

    let registry = super::registry(root)?;
    let generator = registry.resolve(generator)?;
    let record = super::block_on(generator.generate(&request))??;

    let at = Utc::now();
    let mut ledger = CollectionLedger::load(root).context("failed to load collection")?;
    let (file_name, path) = collection::save_result(root, &ledger, &request, &record, at)
        .context("failed to save result")?;

    let item = ledger.record(&request, file_name, at).clone();
    ledger.save(root).context("failed to save collection")?;

    if json {
        return print_json(&serde_json::json!({
            "item": item,
            "path": path,
            "record": record,
        }));
    }

    println!(
        "{} {}  #{} {}",
        request.rarity.stars(),
        request.rarity.display_name(),
        item.id,
        item.name
    );
    if let Some(top) = record.comparisons.last() {
        println!("  top pick: {} (${})", top.label, top.threshold_usd);
    }
    println!("  saved: {}", path.display());
    Ok(())
}
