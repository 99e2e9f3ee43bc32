//! Scout CLI - live filesystem search
//!
//! This is the main entry point. `scout serve` indexes a directory
//! tree and answers queries over a Unix socket; `scout search` is the
//! matching client.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use scout_server::Mode;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod commands;

const DEFAULT_SOCKET: &str = "/tmp/scout.sock";

#[derive(Parser)]
#[command(name = "scout")]
#[command(version)]
#[command(about = "Live filesystem search over a Unix socket", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory tree and serve queries
    Serve {
        /// Root of the tree to index and watch
        #[arg(default_value = "/")]
        root: PathBuf,

        /// Socket path to listen on
        #[arg(short, long, default_value = DEFAULT_SOCKET)]
        socket: PathBuf,

        /// JSON file with exclusion rules
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Query a running daemon
    Search {
        /// Search text
        query: String,

        /// Matching mode
        #[arg(short, long, value_enum, default_value = "substring")]
        mode: SearchMode,

        /// Maximum results to return (0 = unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        limit: usize,

        /// Case-insensitive matching
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Stream results unsorted, in discovery order
        #[arg(long)]
        no_sort: bool,

        /// Print the best match first instead of last
        #[arg(long)]
        descending: bool,

        /// Socket path of the daemon
        #[arg(short, long, default_value = DEFAULT_SOCKET)]
        socket: PathBuf,
    },
}

/// Matching mode as spelled on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum SearchMode {
    Prefix,
    Substring,
    Fuzzy,
}

impl From<SearchMode> for Mode {
    fn from(mode: SearchMode) -> Self {
        match mode {
            SearchMode::Prefix => Mode::Prefix,
            SearchMode::Substring => Mode::Substring,
            SearchMode::Fuzzy => Mode::Fuzzy,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(level))
        .init();

    let result = match cli.command {
        Commands::Serve {
            root,
            socket,
            config,
        } => commands::serve(&root, &socket, config.as_deref()).await,
        Commands::Search {
            query,
            mode,
            limit,
            ignore_case,
            no_sort,
            descending,
            socket,
        } => commands::search(&query, mode.into(), limit, ignore_case, no_sort, descending, &socket),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
