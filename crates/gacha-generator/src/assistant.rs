//! Assistant-backed generator and its fallback chain.
//!
//! 1. batch, instruction in a temp file (or inline, per dialect)
//! 2. batch, instruction on stdin: only when stage 1 produced no record or
//!    the tool rejected the argument form
//! 3. interactive session: after any stage 2 failure
//!
//! A missing executable ends the chain at any stage.

use crate::dialect::AssistantDialect;
use crate::error::{GenerateError, Result};
use crate::ContentGenerator;
use assistant_driver::{CommandRunner, DriverError, Interaction, Invocation, JsonExtractor};
use async_trait::async_trait;
use gacha_core::config::VariantSettings;
use gacha_core::{ContentRecord, GenerationRequest};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Keys a streamed object needs before an interactive run may stop early.
const REQUIRED_KEYS: [&str; 2] = ["comparisons", "lowUsageMessages"];

pub struct AssistantGenerator<D> {
    dialect: D,
    settings: VariantSettings,
    runner: Arc<dyn CommandRunner>,
    extractor: JsonExtractor,
}

impl<D: AssistantDialect> AssistantGenerator<D> {
    pub fn new(dialect: D, settings: VariantSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            dialect,
            settings,
            runner,
            extractor: JsonExtractor::new(),
        }
    }

    pub fn settings(&self) -> &VariantSettings {
        &self.settings
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(
            &self.settings.command,
            Duration::from_millis(self.settings.timeout_ms),
        )
        .install_hint(self.dialect.install_hint(&self.settings.command))
    }

    async fn run_chain(&self, instruction: &str) -> std::result::Result<ContentRecord, DriverError> {
        let variant = self.dialect.name();

        let first = match self.first_stage(instruction).await {
            Ok(record) => return Ok(record),
            Err(e) => e,
        };
        let retry = matches!(first, DriverError::NoStructuredContent)
            || self.dialect.rejects_first_stage(&first);
        if !retry {
            return Err(first);
        }
        tracing::info!(variant, error = %first, "retrying with instruction on stdin");

        let second = match self.stdin_stage(instruction).await {
            Ok(record) => return Ok(record),
            Err(e) => e,
        };
        if matches!(second, DriverError::ExecutableNotFound { .. }) {
            return Err(second);
        }
        tracing::info!(variant, error = %second, "falling back to interactive mode");

        self.interactive_stage(instruction).await
    }

    async fn first_stage(&self, instruction: &str) -> std::result::Result<ContentRecord, DriverError> {
        // Held for the whole stage; dropping it deletes the file on every path.
        let prompt_file = if self.dialect.wants_prompt_file() {
            Some(write_prompt_file(instruction)?)
        } else {
            None
        };
        let args = self
            .dialect
            .first_stage_args(instruction, prompt_file.as_ref().map(|f| f.path()));
        let inv = self.invocation().args(args);
        let out = self.runner.run_batch(&inv).await?;
        self.accept(self.dialect.extract(&self.extractor, &out.stdout)?)
    }

    async fn stdin_stage(&self, instruction: &str) -> std::result::Result<ContentRecord, DriverError> {
        let inv = self
            .invocation()
            .args(self.dialect.stdin_args())
            .stdin(instruction);
        let out = self.runner.run_batch(&inv).await?;
        self.accept(self.dialect.extract(&self.extractor, &out.stdout)?)
    }

    async fn interactive_stage(
        &self,
        instruction: &str,
    ) -> std::result::Result<ContentRecord, DriverError> {
        let inv = self.invocation().args(self.dialect.interactive_args());
        let interaction = Interaction {
            instruction: instruction.to_string(),
            ready_markers: self.dialect.ready_markers(),
            grace: Duration::from_millis(self.settings.prompt_grace_ms),
            required_keys: REQUIRED_KEYS.iter().map(|k| k.to_string()).collect(),
            close_input_after_send: self.dialect.closes_input_after_send(),
        };
        let value = self
            .runner
            .run_interactive(&inv, &interaction, &self.extractor)
            .await?;
        let record: ContentRecord = serde_json::from_value(value).map_err(|e| {
            tracing::debug!(error = %e, "interactive record has the wrong shape");
            DriverError::NoStructuredContent
        })?;
        self.accept(record)
    }

    fn accept(&self, mut record: ContentRecord) -> std::result::Result<ContentRecord, DriverError> {
        if let Err(e) = record.validate() {
            tracing::debug!(variant = self.dialect.name(), error = %e, "rejecting record");
            return Err(DriverError::NoStructuredContent);
        }
        record.sort_comparisons();
        Ok(record)
    }
}

fn write_prompt_file(instruction: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(".gacha-prompt-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(instruction.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[async_trait]
impl<D: AssistantDialect> ContentGenerator for AssistantGenerator<D> {
    fn name(&self) -> &str {
        self.dialect.name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ContentRecord> {
        let instruction = self
            .dialect
            .frame(&crate::prompt::build_instruction(request), request);
        let started = Instant::now();
        match self.run_chain(&instruction).await {
            Ok(record) => {
                tracing::info!(
                    variant = self.dialect.name(),
                    %request,
                    comparisons = record.comparisons.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "generated content"
                );
                Ok(record)
            }
            Err(cause) => Err(GenerateError::GenerationFailed {
                variant: self.dialect.name().to_string(),
                cause,
            }),
        }
    }
}
