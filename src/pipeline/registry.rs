//! Sink Registry
//!
//! Maps each enabled format to the sending half of its sink channel and the
//! task draining it. One `parking_lot::Mutex` guards the map. Every critical
//! section is a single lookup, insert, remove or snapshot; the lock is never
//! held across a channel send or an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::sink::{SinkFormat, SinkStats};
use crate::types::Record;

/// A live sink: its delivery channel and the task consuming it
pub struct SinkEntry {
    sender: mpsc::Sender<Arc<Record>>,
    task: JoinHandle<SinkStats>,
}

impl SinkEntry {
    pub fn new(sender: mpsc::Sender<Arc<Record>>, task: JoinHandle<SinkStats>) -> Self {
        Self { sender, task }
    }

    /// Drop the registry's sender and wait for the sink to drain and exit.
    ///
    /// Senders cloned out by the dispatcher keep the channel open until their
    /// in-flight send lands, so nothing already forwarded is lost.
    pub async fn retire(self) -> Result<SinkStats, JoinError> {
        drop(self.sender);
        self.task.await
    }
}

/// Outcome of resolving one requested format name
#[derive(Debug)]
pub enum Route {
    /// Registered; the cloned sender is usable after the lock is released
    Deliver(SinkFormat, mpsc::Sender<Arc<Record>>),
    /// Supported but not currently enabled
    Disabled(SinkFormat),
    /// Not a supported format at all
    Unknown(String),
}

/// Mutex-guarded map from format to live sink
#[derive(Default)]
pub struct SinkRegistry {
    sinks: Mutex<HashMap<SinkFormat, SinkEntry>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, format: SinkFormat) -> bool {
        self.sinks.lock().contains_key(&format)
    }

    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of the enabled formats
    pub fn formats(&self) -> Vec<SinkFormat> {
        let mut formats: Vec<SinkFormat> = self.sinks.lock().keys().copied().collect();
        formats.sort();
        formats
    }

    /// Insert a new entry. An existing entry is left in place and the
    /// rejected one is handed back to the caller.
    pub fn insert(&self, format: SinkFormat, entry: SinkEntry) -> Result<(), SinkEntry> {
        let mut sinks = self.sinks.lock();
        if sinks.contains_key(&format) {
            return Err(entry);
        }
        sinks.insert(format, entry);
        Ok(())
    }

    pub fn remove(&self, format: SinkFormat) -> Option<SinkEntry> {
        self.sinks.lock().remove(&format)
    }

    /// Remove every entry (used at shutdown)
    pub fn drain(&self) -> Vec<(SinkFormat, SinkEntry)> {
        let mut entries: Vec<(SinkFormat, SinkEntry)> = self.sinks.lock().drain().collect();
        entries.sort_by_key(|(format, _)| *format);
        entries
    }

    /// Resolve requested names to routes under a single lock acquisition.
    ///
    /// Routes come back in request order so per-record delivery order is
    /// deterministic.
    pub fn resolve(&self, names: &[String]) -> Vec<Route> {
        let sinks = self.sinks.lock();
        names
            .iter()
            .map(|name| match name.parse::<SinkFormat>() {
                Ok(format) => match sinks.get(&format) {
                    Some(entry) => Route::Deliver(format, entry.sender.clone()),
                    None => Route::Disabled(format),
                },
                Err(_) => Route::Unknown(name.clone()),
            })
            .collect()
    }
}
