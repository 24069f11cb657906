use anyhow::Context;
use gacha_core::{io, GenerationRequest};
use std::path::Path;

pub fn run(
    root: &Path,
    category: &str,
    rarity: &str,
    generator: Option<&str>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let request = GenerationRequest::from_ids(category, rarity)?;
    let registry = super::registry(root)?;
    let generator = registry.resolve(generator)?;

    let record = super::block_on(generator.generate(&request))??;
    let data = serde_json::to_string_pretty(&record)?;

    match out {
        Some(path) => {
            io::atomic_write(path, data.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{request}: {} comparisons written to {}",
                record.comparisons.len(),
                path.display()
            );
        }
        None => println!("{data}"),
    }
    Ok(())
}
