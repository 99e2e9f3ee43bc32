//! File watcher producing directory change events.
//!
//! Whatever happens to a path, the directory *containing* it is what
//! the engine re-lists, so every raw event is mapped to its parent
//! directory. Content-only modifications never touch the name index
//! and are dropped here.

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use scout_core::{ChangeEvent, ChangeKind, EngineHandle};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Watches a directory tree for name changes.
pub struct FileWatcher {
    #[allow(dead_code)]
    watcher: notify::RecommendedWatcher,
    receiver: Receiver<ChangeEvent>,
}

impl FileWatcher {
    /// Starts watching `root` recursively.
    pub fn new(root: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let kind = match event.kind {
                        EventKind::Create(_) => ChangeKind::Creation,
                        EventKind::Remove(_) => ChangeKind::Deletion,
                        // A rename surfaces as a name modification on
                        // the paths involved; the re-list works out
                        // which side each one was.
                        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Creation,
                        _ => return,
                    };

                    for path in event.paths {
                        let Some(directory) = path.parent() else {
                            continue;
                        };
                        debug!("{:?} under {}", kind, directory.display());
                        let change = ChangeEvent {
                            directory: directory.to_path_buf(),
                            kind,
                        };
                        if tx.send(change).is_err() {
                            warn!("change event receiver dropped");
                        }
                    }
                }
                Err(err) => warn!("watch error: {err}"),
            }
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("watching {} for changes", root.display());

        Ok(Self {
            watcher,
            receiver: rx,
        })
    }

    /// Returns any pending events without blocking.
    pub fn poll(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }

    /// Waits for the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Pumps events into the engine until the watcher stops producing
    /// or the engine shuts down. Intended for its own thread.
    pub fn forward(self, engine: EngineHandle) {
        for event in self.receiver.iter() {
            if !engine.notify_change(event) {
                warn!("engine stopped, ending event forwarding");
                break;
            }
        }
    }
}
