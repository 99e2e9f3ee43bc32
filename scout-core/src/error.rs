//! Error types for the index engine.
//!
//! Everything here is recoverable inside the engine actor. A query that
//! matches nothing is not an error at all; it just produces an empty
//! stream.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for fallible index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Things that can go wrong inside the index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A tree operation addressed a path that isn't in the structure.
    /// Callers treat this as a miss ("nothing to delete"), never a crash.
    #[error("accessing invalid path '{0}'")]
    InvalidPath(PathBuf),

    /// A directory re-list failed, usually a permission error or a race
    /// with deletion. The reconciler logs it and treats the directory as
    /// empty for the pass; the next notification self-heals.
    #[error("failed to read directory '{path}': {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cancellation signal fired mid-query. A normal termination
    /// path, not a failure surfaced to the caller.
    #[error("query aborted by caller")]
    Aborted,
}
