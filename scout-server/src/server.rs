//! Unix socket listener and per-connection query handling.

use crate::protocol::SearchRequest;
use scout_core::{CancelToken, EngineHandle, QueryRequest};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How many result paths may sit between the engine and a slow client
/// before the engine blocks.
const RESULT_BUFFER: usize = 256;

/// Accepts connections on a Unix domain socket and runs one search per
/// connection against the engine.
pub struct SearchServer {
    socket_path: PathBuf,
    engine: EngineHandle,
}

impl SearchServer {
    pub fn new(socket_path: impl Into<PathBuf>, engine: EngineHandle) -> Self {
        Self {
            socket_path: socket_path.into(),
            engine,
        }
    }

    /// Binds the socket and serves connections until the task is
    /// dropped. A stale socket file from a previous run is removed
    /// before binding.
    pub async fn run(self) -> std::io::Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        relax_socket_permissions(&self.socket_path)?;
        info!("listening on {}", self.socket_path.display());

        loop {
            let (stream, _addr) = listener.accept().await?;
            let engine = self.engine.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_connection(stream, engine).await {
                    debug!("connection ended with error: {err}");
                }
            });
        }
    }
}

/// Lets any local user query the daemon, matching how locate-style
/// tools expose their sockets.
fn relax_socket_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666))
}

/// Reads one request, streams its results, closes the stream.
async fn serve_connection(stream: UnixStream, engine: EngineHandle) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();

    let mut line = String::new();
    BufReader::new(read_half).read_line(&mut line).await?;

    let request: SearchRequest = match serde_json::from_str(line.trim_end()) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejecting malformed request: {err}");
            return Ok(());
        }
    };
    debug!("search for {:?}", request.query);

    let (tx, mut rx) = mpsc::channel(RESULT_BUFFER);
    let cancel = CancelToken::new();

    let submitted = engine.submit(QueryRequest {
        query: request.into_query(),
        results: tx,
        cancel: cancel.clone(),
    });
    if !submitted {
        warn!("engine is gone, dropping request");
        return Ok(());
    }

    while let Some(path) = rx.recv().await {
        let mut payload = path.into_bytes();
        payload.push(b'\n');
        if let Err(err) = write_half.write_all(&payload).await {
            // Client went away mid-stream; tell the engine to stop
            // producing for us.
            debug!("client disconnected: {err}");
            cancel.cancel();
            break;
        }
    }

    write_half.shutdown().await.ok();
    Ok(())
}
