pub mod collection;
pub mod config;
pub mod draw;
pub mod generate;
pub mod handle;
pub mod init;
pub mod watch;

use anyhow::Context;
use gacha_core::config::Config;
use gacha_core::{paths, GachaError};
use gacha_generator::GeneratorRegistry;
use std::future::Future;
use std::path::Path;

/// Build a registry over the project's current config.
pub fn registry(root: &Path) -> anyhow::Result<GeneratorRegistry> {
    let config = Config::load(root).context("failed to load config")?;
    Ok(GeneratorRegistry::new(config))
}

/// Run async generator work from a synchronous command.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    Ok(rt.block_on(future))
}

pub fn require_init(root: &Path) -> anyhow::Result<()> {
    if !paths::gacha_dir(root).is_dir() {
        return Err(GachaError::NotInitialized.into());
    }
    Ok(())
}
