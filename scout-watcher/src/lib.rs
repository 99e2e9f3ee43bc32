//! Scout Watcher - filesystem change source
//!
//! This crate is the engine's upstream producer: it watches the
//! filesystem with the notify crate and turns raw events into
//! directory-level [`scout_core::ChangeEvent`]s. The kind attached to
//! each event is advisory; the engine re-lists the directory and
//! trusts only what it finds there.

mod watcher;

pub use watcher::FileWatcher;
