use crate::output::print_json;
use anyhow::Context;
use gacha_core::request::PendingRequest;
use gacha_core::GenerationRequest;
use gacha_generator::GeneratorRegistry;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct Handled {
    pub request: GenerationRequest,
    pub generator: String,
    pub response: PathBuf,
}

pub fn run(root: &Path, generator: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = super::registry(root)?;
    let handled = super::block_on(handle_once(root, &registry, generator))??;

    match (handled, json) {
        (Some(h), true) => print_json(&h),
        (None, true) => print_json(&serde_json::json!({ "handled": null })),
        (Some(h), false) => {
            println!(
                "Answered {} with {}: {}",
                h.request,
                h.generator,
                h.response.display()
            );
            Ok(())
        }
        (None, false) => {
            println!("No pending request.");
            Ok(())
        }
    }
}

/// Answer the request file if one is waiting. On failure the request stays
/// on disk so the next pass retries it.
pub async fn handle_once(
    root: &Path,
    registry: &GeneratorRegistry,
    generator: Option<&str>,
) -> anyhow::Result<Option<Handled>> {
    let Some(pending) = PendingRequest::load(root).context("failed to read request file")? else {
        return Ok(None);
    };
    let request = pending.request;
    let generator = registry.resolve(generator)?;

    let record = generator
        .generate(&request)
        .await
        .with_context(|| format!("request {request} left in place"))?;
    let response = pending
        .respond(root, &record)
        .context("failed to write response")?;

    Ok(Some(Handled {
        request,
        generator: generator.name().to_string(),
        response,
    }))
}
