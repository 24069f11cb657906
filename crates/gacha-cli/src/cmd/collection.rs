use crate::output::{print_json, print_table};
use anyhow::Context;
use gacha_core::collection::CollectionLedger;
use gacha_core::{Category, Rarity};
use std::path::Path;

pub fn run(root: &Path, recent: usize, json: bool) -> anyhow::Result<()> {
    let ledger = CollectionLedger::load(root).context("failed to load collection")?;

    if json {
        return print_json(&ledger);
    }

    if ledger.stats.total_draws == 0 {
        println!("No draws yet. Try: gacha draw");
        return Ok(());
    }

    println!("Total draws: {}\n", ledger.stats.total_draws);

    let rarity_rows = Rarity::all()
        .iter()
        .map(|r| {
            vec![
                r.as_str().to_string(),
                r.display_name().to_string(),
                ledger.count_for(*r).to_string(),
            ]
        })
        .collect();
    print_table(&["RARITY", "NAME", "COUNT"], rarity_rows);
    println!();

    let category_rows = Category::all()
        .iter()
        .map(|c| {
            let n = ledger.stats.by_category.get(c).copied().unwrap_or(0);
            vec![c.display_name().to_string(), n.to_string()]
        })
        .collect();
    print_table(&["CATEGORY", "COUNT"], category_rows);
    println!();

    let recent_rows = ledger
        .recent(recent)
        .map(|item| {
            vec![
                item.id.clone(),
                item.rarity.to_string(),
                item.name.clone(),
                item.obtained_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "RARITY", "NAME", "OBTAINED"], recent_rows);
    Ok(())
}
