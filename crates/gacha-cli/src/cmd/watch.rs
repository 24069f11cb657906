use super::handle::handle_once;
use gacha_core::config::Config;
use std::path::Path;
use std::time::Duration;

pub fn run(root: &Path, interval_ms: u64, generator: Option<&str>) -> anyhow::Result<()> {
    if interval_ms == 0 {
        anyhow::bail!("--interval-ms must be greater than zero");
    }
    let registry = super::registry(root)?;
    tracing::info!(root = %root.display(), interval_ms, "watching for gacha requests");

    super::block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        // One listener for the whole loop, so an interrupt that lands mid
        // generation is not lost between ticks.
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut interrupted => {
                    tracing::info!("interrupted, stopping watch");
                    return;
                }
            }

            // Pick up config edits without restarting.
            match Config::load(root) {
                Ok(cfg) if cfg != registry.config() => registry.update_config(cfg),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "config reload failed, keeping previous"),
            }

            // Dropping the generation kills its child process; the request
            // file stays for the next run.
            tokio::select! {
                outcome = handle_once(root, &registry, generator) => match outcome {
                    Ok(Some(h)) => tracing::info!(
                        request = %h.request,
                        generator = %h.generator,
                        "answered request"
                    ),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %format!("{e:#}"), "request failed, will retry"),
                },
                _ = &mut interrupted => {
                    tracing::info!("interrupted during generation, request left in place");
                    return;
                }
            }
        }
    })
}
