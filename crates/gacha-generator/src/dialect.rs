//! Per-assistant differences: framing, argument forms, readiness and
//! extraction. The fallback chain itself lives in [`crate::assistant`].

use assistant_driver::{DriverError, JsonExtractor};
use gacha_core::config::{CLAUDE_VARIANT, GEMINI_VARIANT};
use gacha_core::{ContentRecord, GenerationRequest, Rarity};
use std::path::Path;

pub trait AssistantDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Wrap the neutral instruction in variant-specific directives.
    fn frame(&self, instruction: &str, request: &GenerationRequest) -> String;

    /// Whether the first stage needs the instruction written to a file.
    fn wants_prompt_file(&self) -> bool {
        true
    }

    /// Arguments for the first batch stage.
    fn first_stage_args(&self, instruction: &str, prompt_file: Option<&Path>) -> Vec<String>;

    /// Arguments for the batch stage that sends the instruction on stdin.
    fn stdin_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn interactive_args(&self) -> Vec<String> {
        Vec::new()
    }

    /// Output fragments that mean the tool is waiting for input.
    fn ready_markers(&self) -> Vec<String>;

    fn closes_input_after_send(&self) -> bool {
        false
    }

    fn install_hint(&self, command: &str) -> String;

    /// True if a first-stage failure means the argument form is unsupported,
    /// so retrying with stdin can help.
    fn rejects_first_stage(&self, err: &DriverError) -> bool;

    fn extract(&self, extractor: &JsonExtractor, stdout: &str) -> Result<ContentRecord, DriverError> {
        extractor.extract(stdout)
    }
}

// ─── Claude ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeDialect;

impl AssistantDialect for ClaudeDialect {
    fn name(&self) -> &'static str {
        CLAUDE_VARIANT
    }

    fn frame(&self, instruction: &str, request: &GenerationRequest) -> String {
        let mut out = String::from(
            "You are an assistant that only produces JSON. Follow the instructions below and \
             output nothing but the JSON object. Do not add explanations or any other text.\n\n",
        );
        out.push_str(instruction);
        if request.rarity == Rarity::LR {
            out.push_str("\nThis is a Legend Rare draw: make the items especially funny and memorable.\n");
        }
        out
    }

    fn first_stage_args(&self, _instruction: &str, prompt_file: Option<&Path>) -> Vec<String> {
        let mut args = vec!["chat".to_string()];
        if let Some(path) = prompt_file {
            args.push("--file".to_string());
            args.push(path.display().to_string());
        }
        args
    }

    fn ready_markers(&self) -> Vec<String> {
        [">", "?", "User:"].iter().map(|s| s.to_string()).collect()
    }

    fn install_hint(&self, command: &str) -> String {
        format!(
            "The Claude CLI ('{command}') is not installed or not on PATH.\n\n\
             Install it:\n  \
             npm install -g @anthropic-ai/claude-code\n\n\
             Then check that '{command}' runs from a terminal, or switch variants:\n  \
             gacha config set gemini"
        )
    }

    fn rejects_first_stage(&self, err: &DriverError) -> bool {
        let text = err.diagnostic();
        text.contains("Unknown option") || text.contains("--file")
    }
}

// ─── Gemini ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiDialect;

impl AssistantDialect for GeminiDialect {
    fn name(&self) -> &'static str {
        GEMINI_VARIANT
    }

    fn frame(&self, instruction: &str, _request: &GenerationRequest) -> String {
        format!(
            "Task: Generate JSON data only. Do not include any explanations or additional text.\n\n\
             {instruction}\n\n\
             Output format: JSON only, no markdown code blocks, no explanations."
        )
    }

    fn wants_prompt_file(&self) -> bool {
        false
    }

    fn first_stage_args(&self, instruction: &str, _prompt_file: Option<&Path>) -> Vec<String> {
        vec!["-p".to_string(), instruction.to_string()]
    }

    /// Gemini reads the whole instruction from stdin without prompting.
    fn ready_markers(&self) -> Vec<String> {
        Vec::new()
    }

    fn closes_input_after_send(&self) -> bool {
        true
    }

    fn install_hint(&self, command: &str) -> String {
        format!(
            "The Gemini CLI ('{command}') is not installed or not on PATH.\n\n\
             Install it:\n  \
             npm install -g @google/gemini-cli\n\n\
             Or switch to another generator:\n  \
             gacha config set claude"
        )
    }

    fn rejects_first_stage(&self, err: &DriverError) -> bool {
        let text = err.diagnostic().to_ascii_lowercase();
        let rejected = ["unknown argument", "unknown option", "unrecognized"]
            .iter()
            .any(|phrase| text.contains(phrase));
        let names_flag = text
            .split(|c: char| c.is_whitespace() || "'\"`,:=".contains(c))
            .any(|token| token == "-p");
        rejected || names_flag
    }

    /// Gemini usually answers with a bare object; try that before scanning.
    fn extract(&self, extractor: &JsonExtractor, stdout: &str) -> Result<ContentRecord, DriverError> {
        extractor.extract_raw_first(stdout)
    }
}
