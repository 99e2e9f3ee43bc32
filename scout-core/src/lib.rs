//! Scout Core - the filesystem index and query engine
//!
//! This crate maintains an in-memory picture of the directory namespace
//! and answers name queries against it:
//! - A path tree mirroring the directory hierarchy, with per-subtree
//!   character masks for fuzzy-search pruning
//! - A basename trie mapping names to their tree nodes
//! - A reconciler that applies directory change notifications as
//!   minimal diffs
//! - A query engine for prefix, substring, and fuzzy searches with
//!   streamed, cancellable results
//!
//! All of that state is owned by a single actor; see [`run_engine`].
//! Change events and queries arrive as messages and are processed one
//! at a time, so nothing here needs a lock.

pub mod engine;
pub mod error;
pub mod filter;
pub mod mask;
pub mod name_index;
pub mod query;
pub mod reconcile;
pub mod tree;

pub use engine::{
    engine_channel, run_engine, ChangeEvent, ChangeKind, EngineHandle, EngineMessage, IndexEngine,
};
pub use error::{IndexError, Result};
pub use filter::{FilterConfig, PathFilter};
pub use name_index::NameIndex;
pub use query::{CancelToken, Query, QueryMode, QueryRequest};
pub use reconcile::ScanStats;
pub use tree::{NodeId, PathTree};
