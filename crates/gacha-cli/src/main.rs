mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gacha",
    about = "Usage gacha: draw a category and rarity, generate flavor text for it",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .gacha/)
    #[arg(long, global = true, env = "GACHA_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .gacha/ and a default config
    Init,

    /// Inspect and change generator settings
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Generate content for one category and rarity
    Generate {
        /// Category id: tech, gadget, food, entertainment, life
        #[arg(long)]
        category: String,
        /// Rarity id: N, R, SR, UR, LR
        #[arg(long)]
        rarity: String,
        /// Generator variant (default: the configured one)
        #[arg(long)]
        generator: Option<String>,
        /// Write the record here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Draw a random category and rarity, generate, and add it to the collection
    Draw {
        #[arg(long)]
        generator: Option<String>,
    },

    /// Show the collection ledger
    Collection {
        /// How many recent draws to list
        #[arg(long, default_value = "10")]
        recent: usize,
    },

    /// Run a real generation against one variant, or all of them
    SelfTest {
        #[arg(long)]
        generator: Option<String>,
    },

    /// Answer a pending .gacha-request.json once
    Handle {
        #[arg(long)]
        generator: Option<String>,
    },

    /// Poll for request files and answer them until interrupted
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        #[arg(long)]
        generator: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Generate {
            category,
            rarity,
            generator,
            out,
        } => cmd::generate::run(
            &root,
            &category,
            &rarity,
            generator.as_deref(),
            out.as_deref(),
        ),
        Commands::Draw { generator } => cmd::draw::run(&root, generator.as_deref(), cli.json),
        Commands::Collection { recent } => cmd::collection::run(&root, recent, cli.json),
        Commands::SelfTest { generator } => {
            cmd::self_test::run(&root, generator.as_deref(), cli.json)
        }
        Commands::Handle { generator } => cmd::handle::run(&root, generator.as_deref(), cli.json),
        Commands::Watch {
            interval_ms,
            generator,
        } => cmd::watch::run(&root, interval_ms, generator.as_deref()),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
