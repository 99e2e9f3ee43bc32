//! Scout Server - the request boundary
//!
//! Listens on a Unix domain socket for search requests. Each
//! connection carries exactly one JSON-encoded request; the server
//! submits it to the engine actor and streams matching paths back as
//! newline-delimited text, closing the connection when the query
//! finishes or the client goes away.

pub mod protocol;
mod server;

pub use protocol::{Mode, SearchRequest, Settings};
pub use server::SearchServer;
