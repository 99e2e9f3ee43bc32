//! The engine actor.
//!
//! One logical owner of the path tree and name index. Change events
//! and queries arrive on a single FIFO channel and are processed one
//! at a time, so mutation (the reconciler) and reads (the query
//! engine) never interleave and the two structures need no locking.
//! A query submitted after a change event is guaranteed to observe
//! that event's effects.

use crate::filter::PathFilter;
use crate::name_index::NameIndex;
use crate::query::QueryRequest;
use crate::tree::PathTree;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, info};

/// Advisory change kind. The reconciler re-lists the directory either
/// way and never trusts the kind as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Creation,
    Deletion,
}

/// A notification that a directory's content may have changed. A
/// rename arrives as two independent events (creation at the
/// destination, deletion at the source), in either order.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub directory: PathBuf,
    pub kind: ChangeKind,
}

/// Messages the actor processes in strict arrival order.
pub enum EngineMessage {
    Changed(ChangeEvent),
    Search(QueryRequest),
}

/// The index state: the two owned structures plus the exclusion policy
/// that both population paths share. Constructed once at startup and
/// handed to the actor; there are no process-wide instances.
pub struct IndexEngine {
    pub(crate) tree: PathTree,
    pub(crate) names: NameIndex,
    pub(crate) filter: PathFilter,
}

impl IndexEngine {
    pub fn new(filter: PathFilter) -> Self {
        Self {
            tree: PathTree::new(),
            names: NameIndex::new(),
            filter,
        }
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }
}

/// Cloneable handle for submitting messages to a running actor.
#[derive(Clone)]
pub struct EngineHandle {
    sender: Sender<EngineMessage>,
}

impl EngineHandle {
    /// Queues a change event. Returns false once the actor has stopped.
    pub fn notify_change(&self, event: ChangeEvent) -> bool {
        self.sender.send(EngineMessage::Changed(event)).is_ok()
    }

    /// Queues a query. Returns false once the actor has stopped; the
    /// request's result channel is then simply dropped (closed).
    pub fn submit(&self, request: QueryRequest) -> bool {
        self.sender.send(EngineMessage::Search(request)).is_ok()
    }
}

/// Creates the actor's message channel.
pub fn engine_channel() -> (EngineHandle, Receiver<EngineMessage>) {
    let (sender, receiver) = channel();
    (EngineHandle { sender }, receiver)
}

/// Runs the actor loop until every handle has been dropped. Intended
/// for a dedicated thread.
pub fn run_engine(mut engine: IndexEngine, messages: Receiver<EngineMessage>) {
    info!("engine actor started");
    for message in messages {
        match message {
            EngineMessage::Changed(event) => {
                debug!(
                    "change event for {} ({:?})",
                    event.directory.display(),
                    event.kind
                );
                engine.refresh_directory(&event.directory.to_string_lossy());
            }
            EngineMessage::Search(request) => engine.search(request),
        }
    }
    info!("engine actor stopped");
}
