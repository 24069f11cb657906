use assistant_driver::{BatchOutput, CommandRunner, DriverError, Interaction, Invocation, JsonExtractor};
use async_trait::async_trait;
use gacha_core::config::{Config, VariantSettings};
use gacha_core::{Category, GenerationRequest, Rarity};
use gacha_generator::{
    AssistantGenerator, ClaudeDialect, ContentGenerator, GeminiDialect, GenerateError,
    GeneratorRegistry,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const RECORD: &str = r#"{
  "comparisons": [{"usd": 20, "item": "ChatGPT Plus"}, {"usd": 4, "item": "GitHub Team"}],
  "lowUsageMessages": ["Plenty of headroom left"],
  "templates": {
    "savingsComparison": "saved {item}",
    "buffetMode": "buffet {totalCost}",
    "lowUsage": "{message}",
    "highUsageDefault": "server bill"
  },
  "thresholds": {"savingsComparisonMin": 12, "buffetModeMin": 0}
}"#;

// ---------------------------------------------------------------------------
// Stub runner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Call {
    interactive: bool,
    command: String,
    args: Vec<String>,
    stdin: Option<String>,
    timeout_ms: u64,
    /// Path passed after `--file`, and whether it existed during the call.
    prompt_file: Option<(PathBuf, bool)>,
    ready_markers: Vec<String>,
}

#[derive(Default)]
struct StubRunner {
    batch: Mutex<VecDeque<Result<BatchOutput, DriverError>>>,
    interactive: Mutex<VecDeque<Result<Value, DriverError>>>,
    calls: Mutex<Vec<Call>>,
}

impl StubRunner {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn batch(self: &Arc<Self>, result: Result<&str, DriverError>) -> Arc<Self> {
        let result = result.map(|stdout| BatchOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        });
        self.batch.lock().unwrap().push_back(result);
        Arc::clone(self)
    }

    fn interactive(self: &Arc<Self>, result: Result<Value, DriverError>) -> Arc<Self> {
        self.interactive.lock().unwrap().push_back(result);
        Arc::clone(self)
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, inv: &Invocation, interactive: bool, ready_markers: Vec<String>) {
        let prompt_file = inv
            .args
            .iter()
            .position(|a| a == "--file")
            .and_then(|i| inv.args.get(i + 1))
            .map(|p| {
                let path = PathBuf::from(p);
                let existed = path.exists();
                (path, existed)
            });
        self.calls.lock().unwrap().push(Call {
            interactive,
            command: inv.command.clone(),
            args: inv.args.clone(),
            stdin: inv.stdin.clone(),
            timeout_ms: inv.timeout.as_millis() as u64,
            prompt_file,
            ready_markers,
        });
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run_batch(&self, inv: &Invocation) -> Result<BatchOutput, DriverError> {
        self.record(inv, false, Vec::new());
        self.batch
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DriverError::NoStructuredContent))
    }

    async fn run_interactive(
        &self,
        inv: &Invocation,
        interaction: &Interaction,
        _extractor: &JsonExtractor,
    ) -> Result<Value, DriverError> {
        self.record(inv, true, interaction.ready_markers.clone());
        self.interactive
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DriverError::NoStructuredContent))
    }
}

fn unsupported_file_form() -> DriverError {
    DriverError::ProcessFailed {
        code: Some(2),
        stderr: "error: Unknown option '--file'".into(),
    }
}

fn claude(runner: &Arc<StubRunner>) -> AssistantGenerator<ClaudeDialect> {
    AssistantGenerator::new(ClaudeDialect, VariantSettings::new("claude"), runner.clone())
}

fn request() -> GenerationRequest {
    GenerationRequest::new(Category::Tech, Rarity::N)
}

// ---------------------------------------------------------------------------
// Fallback chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsupported_file_form_falls_back_to_stdin() {
    let runner = StubRunner::new()
        .batch(Err(unsupported_file_form()))
        .batch(Ok(format!("Sure!\n```json\n{RECORD}\n```").as_str()));

    let record = claude(&runner).generate(&request()).await.unwrap();
    assert_eq!(record.low_usage_messages, ["Plenty of headroom left"]);

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);

    let (path, existed) = calls[0].prompt_file.clone().expect("first stage passes a file");
    assert_eq!(calls[0].args[0], "chat");
    assert!(existed, "prompt file should exist while the tool runs");
    assert!(!path.exists(), "prompt file should be gone after the call");
    assert!(calls[0].stdin.is_none());

    assert!(calls[1].args.is_empty());
    let stdin = calls[1].stdin.as_deref().unwrap();
    assert!(stdin.starts_with("You are an assistant that only produces JSON"));
    assert!(stdin.contains("Category: Tech"));
}

#[tokio::test]
async fn output_without_record_falls_back_to_stdin() {
    let runner = StubRunner::new()
        .batch(Ok("I'd be happy to help! What would you like?"))
        .batch(Ok(RECORD));
    claude(&runner).generate(&request()).await.unwrap();
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn record_failing_validation_counts_as_missing() {
    let empty = RECORD.replace(r#"["Plenty of headroom left"]"#, "[]");
    let runner = StubRunner::new().batch(Ok(empty.as_str())).batch(Ok(RECORD));
    let record = claude(&runner).generate(&request()).await.unwrap();
    assert_eq!(record.low_usage_messages.len(), 1);
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn stdin_failure_falls_back_to_interactive() {
    let value: Value = serde_json::from_str(RECORD).unwrap();
    let runner = StubRunner::new()
        .batch(Err(unsupported_file_form()))
        .batch(Err(DriverError::ProcessFailed {
            code: Some(1),
            stderr: "stdin is not a tty".into(),
        }))
        .interactive(Ok(value));

    let record = claude(&runner).generate(&request()).await.unwrap();
    assert_eq!(record.comparisons.len(), 2);

    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[2].interactive);
    assert_eq!(calls[2].ready_markers, [">", "?", "User:"]);
}

#[tokio::test]
async fn comparisons_come_back_sorted() {
    let runner = StubRunner::new().batch(Ok(RECORD));
    let record = claude(&runner).generate(&request()).await.unwrap();
    let prices: Vec<f64> = record.comparisons.iter().map(|c| c.threshold_usd).collect();
    assert_eq!(prices, [4.0, 20.0]);
}

#[tokio::test]
async fn missing_executable_aborts_the_chain() {
    let runner = StubRunner::new().batch(Err(DriverError::ExecutableNotFound {
        command: "claude".into(),
        hint: "install it".into(),
    }));
    let err = claude(&runner).generate(&request()).await.unwrap_err();
    assert!(matches!(
        err.cause(),
        Some(DriverError::ExecutableNotFound { .. })
    ));

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let (path, _) = calls[0].prompt_file.clone().unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn missing_executable_at_stdin_stage_skips_interactive() {
    let runner = StubRunner::new()
        .batch(Err(unsupported_file_form()))
        .batch(Err(DriverError::ExecutableNotFound {
            command: "claude".into(),
            hint: "install it".into(),
        }));
    let err = claude(&runner).generate(&request()).await.unwrap_err();
    assert!(matches!(err.cause(), Some(DriverError::ExecutableNotFound { .. })));
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn timeout_at_first_stage_aborts() {
    let runner = StubRunner::new().batch(Err(DriverError::Timeout {
        command: "claude".into(),
        timeout_ms: 30_000,
    }));
    let err = claude(&runner).generate(&request()).await.unwrap_err();
    assert!(matches!(err.cause(), Some(DriverError::Timeout { .. })));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn exhausted_chain_is_generation_failed() {
    let runner = StubRunner::new()
        .batch(Ok("nope"))
        .batch(Ok("still nope"))
        .interactive(Err(DriverError::NoStructuredContent));
    let err = claude(&runner).generate(&request()).await.unwrap_err();
    match &err {
        GenerateError::GenerationFailed { variant, cause } => {
            assert_eq!(variant, "claude");
            assert!(matches!(cause, DriverError::NoStructuredContent));
        }
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
    assert!(err.chain().contains("no structured content"));
}

#[tokio::test]
async fn gemini_passes_instruction_inline_and_reads_bare_json() {
    let runner = StubRunner::new()
        .batch(Err(DriverError::ProcessFailed {
            code: Some(1),
            stderr: "Unknown argument: p".into(),
        }))
        .batch(Ok(RECORD));
    let gemini = AssistantGenerator::new(GeminiDialect, VariantSettings::new("gemini"), runner.clone());
    gemini.generate(&request()).await.unwrap();

    let calls = runner.calls();
    assert_eq!(calls[0].args[0], "-p");
    assert!(calls[0].args[1].starts_with("Task: Generate JSON data only."));
    assert!(calls[0].prompt_file.is_none());
    assert!(calls[1].stdin.is_some());
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn registry_caches_one_instance_per_variant() {
    let registry = GeneratorRegistry::with_runner(Config::default(), StubRunner::new());
    let a = registry.resolve(Some("claude")).unwrap();
    let b = registry.resolve(None).unwrap();
    assert!(Arc::ptr_eq(&a, &b), "default generator is claude");
    let s = registry.resolve(Some("static")).unwrap();
    assert_eq!(s.name(), "static");
    assert!(!Arc::ptr_eq(&a, &s));
}

#[tokio::test]
async fn update_config_clears_cache_and_applies_settings() {
    let runner = StubRunner::new();
    let registry = GeneratorRegistry::with_runner(Config::default(), runner.clone());
    let before = registry.resolve(Some("gemini")).unwrap();

    let mut cfg = registry.config();
    cfg.generator = "gemini".into();
    cfg.generators.insert(
        "gemini".into(),
        VariantSettings {
            command: "/opt/bin/gemini".into(),
            timeout_ms: 45_000,
            prompt_grace_ms: 100,
        },
    );
    registry.update_config(cfg);

    let after = registry.resolve(None).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));

    runner.batch(Ok(RECORD));
    after.generate(&request()).await.unwrap();
    let call = &runner.calls()[0];
    assert_eq!(call.command, "/opt/bin/gemini");
    assert_eq!(call.timeout_ms, 45_000);
}

#[test]
fn unknown_variant_is_unknown_generator_type() {
    let registry = GeneratorRegistry::with_runner(Config::default(), StubRunner::new());
    let err = registry.resolve(Some("gpt")).err().unwrap();
    assert!(matches!(err, GenerateError::UnknownGeneratorType { ref name, .. } if name == "gpt"));
    assert!(err.to_string().contains("static, claude, gemini"));
}

#[tokio::test]
async fn self_test_reports_instead_of_failing() {
    let runner = StubRunner::new().batch(Err(DriverError::ExecutableNotFound {
        command: "claude".into(),
        hint: "npm install -g @anthropic-ai/claude-code".into(),
    }));
    let registry = GeneratorRegistry::with_runner(Config::default(), runner);

    let ok = registry.self_test("static").await;
    assert!(ok.passed, "{}", ok.detail);

    let bad = registry.self_test("claude").await;
    assert!(!bad.passed);
    assert!(bad.detail.contains("not found"));

    let unknown = registry.self_test("gpt").await;
    assert!(!unknown.passed);
}

#[tokio::test]
async fn self_test_all_covers_every_variant() {
    let registry = GeneratorRegistry::with_runner(Config::default(), StubRunner::new());
    let reports = registry.self_test_all().await;
    let names: Vec<_> = reports.iter().map(|r| r.variant.as_str()).collect();
    assert_eq!(names, ["static", "claude", "gemini"]);
    assert!(reports[0].passed);
    assert!(!reports[1].passed);
}

#[test]
fn static_is_always_available() {
    let mut cfg = Config::default();
    cfg.generators
        .get_mut("claude")
        .unwrap()
        .command = "no-such-assistant-7c1e".into();
    let registry = GeneratorRegistry::with_runner(cfg, StubRunner::new());
    let avail = registry.availability();
    assert!(avail.iter().any(|a| a.variant == "static" && a.available));
    let claude = avail.iter().find(|a| a.variant == "claude").unwrap();
    assert!(!claude.available);
    assert!(claude.path.is_none());
}
