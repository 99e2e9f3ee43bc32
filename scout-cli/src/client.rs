//! Blocking client side of the daemon socket.

use scout_server::SearchRequest;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Sends one request and feeds every returned path to `on_result` as
/// it arrives. Returns once the daemon closes the stream.
pub fn run_search(
    socket: &Path,
    request: &SearchRequest,
    mut on_result: impl FnMut(&str),
) -> io::Result<()> {
    let mut stream = UnixStream::connect(socket)?;

    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let reader = BufReader::new(stream);
    for path in reader.lines() {
        on_result(&path?);
    }

    Ok(())
}
