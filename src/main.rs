//! `e2e-trace`: load end-to-end trace files and print what they contain.
//!
//! ```bash
//! e2e-trace tree client.jsonl server.jsonl
//! e2e-trace --thread-mode columns service.jsonl
//! RUST_LOG=debug e2e-trace exchanges *.jsonl
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use e2etrace::config::TraceConfig;
use e2etrace::loader::{LoadState, Loader};
use e2etrace::trace::display;

#[derive(Parser)]
#[command(name = "e2e-trace")]
#[command(about = "Correlate and order end-to-end activity traces", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Config file (overrides E2ETRACE_CONFIG_PATH and the default location)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// One execution column per thread instead of per process
    #[arg(long, global = true)]
    thread_mode: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the activity hierarchy
    Tree {
        /// Trace files (JSON lines)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print execution columns and the activities in each
    Columns {
        /// Trace files (JSON lines)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print matched message exchanges and unmatched records
    Exchanges {
        /// Trace files (JSON lines)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Commands {
    fn files(&self) -> &[PathBuf] {
        match self {
            Self::Tree { files } | Self::Columns { files } | Self::Exchanges { files } => files,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config =
        TraceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.thread_mode {
        config.thread_mode = true;
    }

    let outcome = Loader::new(config).load(cli.command.files())?;
    if outcome.state != LoadState::Loaded {
        anyhow::bail!("load stopped early ({})", outcome.state);
    }
    log::debug!(
        "Loaded {} records from {} files ({} skipped)",
        outcome.stats.records,
        outcome.stats.files,
        outcome.stats.skipped
    );

    let source = outcome.source;
    let output = match &cli.command {
        Commands::Tree { .. } => display::render_tree(&source),
        Commands::Columns { .. } => display::render_columns(&source, &source.layout()),
        Commands::Exchanges { .. } => {
            let correlation = source.correlate_message_exchanges(&source.trace_ids());
            display::render_exchanges(&source, &correlation)
        }
    };
    print!("{output}");
    Ok(())
}
