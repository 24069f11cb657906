use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const STATIC_VARIANT: &str = "static";
pub const CLAUDE_VARIANT: &str = "claude";
pub const GEMINI_VARIANT: &str = "gemini";

/// Every variant name a generator implementation exists for.
pub const KNOWN_VARIANTS: &[&str] = &[STATIC_VARIANT, CLAUDE_VARIANT, GEMINI_VARIANT];

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// VariantSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSettings {
    /// Executable name or path for the assistant CLI.
    pub command: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// How long interactive mode waits for a prompt before typing anyway.
    #[serde(default = "default_prompt_grace_ms")]
    pub prompt_grace_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_prompt_grace_ms() -> u64 {
    100
}

impl VariantSettings {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout_ms: default_timeout_ms(),
            prompt_grace_ms: default_prompt_grace_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Variant used when a caller does not name one.
    #[serde(default = "default_generator")]
    pub generator: String,
    #[serde(default = "default_generators")]
    pub generators: BTreeMap<String, VariantSettings>,
}

fn default_version() -> u32 {
    1
}

fn default_generator() -> String {
    CLAUDE_VARIANT.to_string()
}

fn default_generators() -> BTreeMap<String, VariantSettings> {
    let mut m = BTreeMap::new();
    m.insert(CLAUDE_VARIANT.to_string(), VariantSettings::new("claude"));
    m.insert(GEMINI_VARIANT.to_string(), VariantSettings::new("gemini"));
    m
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            generator: default_generator(),
            generators: default_generators(),
        }
    }
}

impl Config {
    /// Load `.gacha/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Settings for `variant`; a variant without an entry runs a command of
    /// the same name with default timings.
    pub fn settings_for(&self, variant: &str) -> VariantSettings {
        self.generators
            .get(variant)
            .cloned()
            .unwrap_or_else(|| VariantSettings::new(variant))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !KNOWN_VARIANTS.contains(&self.generator.as_str()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "generator '{}' has no implementation; valid: {}",
                    self.generator,
                    KNOWN_VARIANTS.join(", ")
                ),
            });
        }

        for (name, settings) in &self.generators {
            if !KNOWN_VARIANTS.contains(&name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown variant '{name}' in generators"),
                });
            }
            if settings.command.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("variant '{name}' has an empty command"),
                });
            }
            if settings.timeout_ms == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("variant '{name}' has timeout_ms=0"),
                });
            }
            if settings.prompt_grace_ms >= settings.timeout_ms {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "variant '{name}' waits {}ms for a prompt but times out after {}ms",
                        settings.prompt_grace_ms, settings.timeout_ms
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.generator, "claude");
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.generator = "gemini".into();
        cfg.generators.get_mut("gemini").unwrap().timeout_ms = 45_000;
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.generator, "gemini");
        assert_eq!(loaded.settings_for("gemini").timeout_ms, 45_000);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "generator: static\ngenerators:\n  claude:\n    command: /opt/bin/claude\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.version, 1);
        let claude = cfg.settings_for("claude");
        assert_eq!(claude.command, "/opt/bin/claude");
        assert_eq!(claude.timeout_ms, 30_000);
        assert_eq!(claude.prompt_grace_ms, 100);
    }

    #[test]
    fn settings_for_unlisted_variant_uses_its_name() {
        let cfg = Config::default();
        assert_eq!(cfg.settings_for("static").command, "static");
    }

    #[test]
    fn validate_default_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_unknown_generator_is_error() {
        let mut cfg = Config::default();
        cfg.generator = "gpt".into();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("'gpt'")));
    }

    #[test]
    fn validate_empty_command_and_zero_timeout() {
        let mut cfg = Config::default();
        let claude = cfg.generators.get_mut("claude").unwrap();
        claude.command = " ".into();
        claude.timeout_ms = 0;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("empty command")));
        assert!(warnings.iter().any(|w| w.message.contains("timeout_ms=0")));
    }

    #[test]
    fn validate_unknown_variant_entry_is_warning() {
        let mut cfg = Config::default();
        cfg.generators.insert("llama".into(), VariantSettings::new("llama"));
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("'llama'")));
    }
}
