//! Resolves variant names to generator instances.
//!
//! One instance per variant name is built on first use and reused until
//! [`GeneratorRegistry::update_config`] swaps the configuration, which drops
//! every cached instance so later resolutions see the new settings.

use crate::assistant::AssistantGenerator;
use crate::dialect::{ClaudeDialect, GeminiDialect};
use crate::error::{GenerateError, Result};
use crate::static_gen::StaticGenerator;
use crate::ContentGenerator;
use assistant_driver::{CommandRunner, ProcessRunner};
use gacha_core::config::{
    Config, CLAUDE_VARIANT, GEMINI_VARIANT, KNOWN_VARIANTS, STATIC_VARIANT,
};
use gacha_core::{Category, GenerationRequest, Rarity};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct SelfTestReport {
    pub variant: String,
    pub passed: bool,
    pub detail: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub variant: String,
    pub command: Option<String>,
    /// Resolved executable, or `None` when it is not on PATH.
    pub path: Option<PathBuf>,
    pub available: bool,
}

pub struct GeneratorRegistry {
    config: RwLock<Config>,
    cache: Mutex<HashMap<String, Arc<dyn ContentGenerator>>>,
    runner: Arc<dyn CommandRunner>,
}

impl GeneratorRegistry {
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner::new()))
    }

    /// Build with a custom process runner, e.g. a stub in tests.
    pub fn with_runner(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: RwLock::new(config),
            cache: Mutex::new(HashMap::new()),
            runner,
        }
    }

    pub fn config(&self) -> Config {
        match self.config.read() {
            Ok(cfg) => cfg.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the configuration and drop every cached instance. Persisting
    /// the new configuration is the caller's job.
    pub fn update_config(&self, config: Config) {
        match self.config.write() {
            Ok(mut cfg) => *cfg = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
        self.cache().clear();
        tracing::debug!("generator cache cleared after config update");
    }

    /// Resolve `variant`, or the configured default when `None`.
    pub fn resolve(&self, variant: Option<&str>) -> Result<Arc<dyn ContentGenerator>> {
        let config = self.config();
        let name = variant.unwrap_or(config.generator.as_str()).to_string();

        if let Some(hit) = self.cache().get(&name) {
            return Ok(Arc::clone(hit));
        }

        let built = self.construct(&name, &config)?;
        // Another caller may have raced us here; keep whichever landed first.
        let mut cache = self.cache();
        let entry = cache.entry(name).or_insert(built);
        Ok(Arc::clone(entry))
    }

    fn construct(&self, name: &str, config: &Config) -> Result<Arc<dyn ContentGenerator>> {
        let runner = Arc::clone(&self.runner);
        let generator: Arc<dyn ContentGenerator> = match name {
            STATIC_VARIANT => Arc::new(StaticGenerator::new()?),
            CLAUDE_VARIANT => Arc::new(AssistantGenerator::new(
                ClaudeDialect,
                config.settings_for(CLAUDE_VARIANT),
                runner,
            )),
            GEMINI_VARIANT => Arc::new(AssistantGenerator::new(
                GeminiDialect,
                config.settings_for(GEMINI_VARIANT),
                runner,
            )),
            other => {
                return Err(GenerateError::UnknownGeneratorType {
                    name: other.to_string(),
                    valid: KNOWN_VARIANTS.join(", "),
                })
            }
        };
        tracing::debug!(variant = name, "constructed generator");
        Ok(generator)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn ContentGenerator>>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Run one real generation for tech/N. Never fails; problems land in the
    /// report.
    pub async fn self_test(&self, variant: &str) -> SelfTestReport {
        let started = Instant::now();
        let request = GenerationRequest::new(Category::Tech, Rarity::N);

        let outcome = match self.resolve(Some(variant)) {
            Ok(generator) => generator.generate(&request).await,
            Err(e) => Err(e),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (passed, detail) = match outcome {
            Ok(record) => (
                true,
                format!(
                    "{} comparisons, {} low-usage messages",
                    record.comparisons.len(),
                    record.low_usage_messages.len()
                ),
            ),
            Err(e) => (false, e.chain()),
        };
        tracing::info!(variant, passed, elapsed_ms, "self-test finished");
        SelfTestReport {
            variant: variant.to_string(),
            passed,
            detail,
            elapsed_ms,
        }
    }

    pub async fn self_test_all(&self) -> Vec<SelfTestReport> {
        let mut reports = Vec::with_capacity(KNOWN_VARIANTS.len());
        for variant in KNOWN_VARIANTS {
            reports.push(self.self_test(variant).await);
        }
        reports
    }

    /// Which variants can run here: `static` always, assistants when their
    /// command resolves on PATH.
    pub fn availability(&self) -> Vec<Availability> {
        let config = self.config();
        KNOWN_VARIANTS
            .iter()
            .map(|&variant| {
                if variant == STATIC_VARIANT {
                    return Availability {
                        variant: variant.to_string(),
                        command: None,
                        path: None,
                        available: true,
                    };
                }
                let command = config.settings_for(variant).command;
                let path = which::which(&command).ok();
                Availability {
                    variant: variant.to_string(),
                    available: path.is_some(),
                    command: Some(command),
                    path,
                }
            })
            .collect()
    }
}
