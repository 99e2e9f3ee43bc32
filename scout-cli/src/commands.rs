//! CLI command implementations.

use crate::client;
use colored::Colorize;
use scout_core::{engine_channel, run_engine, FilterConfig, IndexEngine, PathFilter};
use scout_server::{Mode, SearchRequest, SearchServer, Settings};
use scout_watcher::FileWatcher;
use std::fs;
use std::path::Path;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Index a tree, watch it, and serve queries until interrupted.
pub async fn serve(root: &Path, socket: &Path, config: Option<&Path>) -> Result<()> {
    let filter = match config {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let rules: FilterConfig = serde_json::from_str(&text)?;
            PathFilter::compile(&rules)?
        }
        None => PathFilter::allow_all(),
    };

    println!("{}", "Indexing filesystem...".cyan());
    let mut engine = IndexEngine::new(filter);
    let stats = engine.scan(&root.to_string_lossy());
    println!(
        "{} Indexed {} files and {} directories in {}ms",
        "✓".green(),
        stats.files.to_string().cyan(),
        stats.directories.to_string().cyan(),
        stats.duration_ms
    );

    let (handle, messages) = engine_channel();
    std::thread::spawn(move || run_engine(engine, messages));
    debug!("engine actor running");

    let watcher = FileWatcher::new(root)?;
    let forward_to = handle.clone();
    std::thread::spawn(move || watcher.forward(forward_to));

    println!("{} Listening on {}", "✓".green(), socket.display());
    println!("  Press {} to stop", "Ctrl+C".cyan());

    let server = SearchServer::new(socket, handle);
    server.run().await?;

    Ok(())
}

/// Send one query to a running daemon and print its results.
pub fn search(
    query: &str,
    mode: Mode,
    limit: usize,
    ignore_case: bool,
    no_sort: bool,
    descending: bool,
    socket: &Path,
) -> Result<()> {
    let request = SearchRequest {
        query: query.to_string(),
        settings: Settings {
            mode,
            max_results: limit,
            no_sort,
            sort_descending: descending,
            case_insensitive: ignore_case,
        },
    };

    let mut count = 0usize;
    client::run_search(socket, &request, |path| {
        println!("{path}");
        count += 1;
    })?;

    if count == 0 {
        println!("No matches for \"{}\"", query);
    } else {
        eprintln!("{}", format!("{count} matches").dimmed());
    }

    Ok(())
}
