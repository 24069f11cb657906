use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use gacha_core::config::{Config, WarnLevel, KNOWN_VARIANTS, STATIC_VARIANT};
use gacha_generator::GeneratorRegistry;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the default generator, per-variant settings and availability
    Show,

    /// Set the default generator
    Set {
        /// Variant name: static, claude or gemini
        variant: String,
    },

    /// Point an assistant variant at a different executable
    SetCommand {
        variant: String,
        command: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Set { variant } => set(root, &variant),
        ConfigSubcommand::SetCommand {
            variant,
            command,
            timeout_ms,
        } => set_command(root, &variant, &command, timeout_ms),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn load(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load(root)?;
    let availability = GeneratorRegistry::new(config.clone()).availability();

    if json {
        let value = serde_json::json!({
            "generator": config.generator,
            "generators": config.generators,
            "availability": availability,
        });
        return print_json(&value);
    }

    println!("Default generator: {}\n", config.generator);
    let rows = availability
        .iter()
        .map(|a| {
            let settings = config.settings_for(&a.variant);
            let (command, timeout) = if a.variant == STATIC_VARIANT {
                ("-".to_string(), "-".to_string())
            } else {
                (settings.command, format!("{}ms", settings.timeout_ms))
            };
            let found = match (&a.path, a.available) {
                (Some(p), _) => p.display().to_string(),
                (None, true) => "built in".to_string(),
                (None, false) => "not found".to_string(),
            };
            vec![a.variant.clone(), command, timeout, found]
        })
        .collect();
    print_table(&["VARIANT", "COMMAND", "TIMEOUT", "PATH"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// set / set-command
// ---------------------------------------------------------------------------

fn set(root: &Path, variant: &str) -> anyhow::Result<()> {
    if !KNOWN_VARIANTS.contains(&variant) {
        anyhow::bail!(
            "unknown generator '{variant}'; valid: {}",
            KNOWN_VARIANTS.join(", ")
        );
    }
    let mut config = load(root)?;
    config.generator = variant.to_string();
    config.save(root).context("failed to write config.yaml")?;
    println!("Default generator set to {variant}");
    Ok(())
}

fn set_command(
    root: &Path,
    variant: &str,
    command: &str,
    timeout_ms: Option<u64>,
) -> anyhow::Result<()> {
    if variant == STATIC_VARIANT || !KNOWN_VARIANTS.contains(&variant) {
        anyhow::bail!("'{variant}' is not an assistant variant; use claude or gemini");
    }
    if command.trim().is_empty() {
        anyhow::bail!("command must not be empty");
    }
    if timeout_ms == Some(0) {
        anyhow::bail!("--timeout-ms must be greater than zero");
    }

    let mut config = load(root)?;
    let mut settings = config.settings_for(variant);
    settings.command = command.to_string();
    if let Some(ms) = timeout_ms {
        settings.timeout_ms = ms;
    }
    println!(
        "{variant}: command={} timeout={}ms",
        settings.command, settings.timeout_ms
    );
    config.generators.insert(variant.to_string(), settings);
    config.save(root).context("failed to write config.yaml")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load(root)?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
