//! Append-only event log shared by all components.
//!
//! Components record one event per state mutation so that indexers can
//! rebuild full state from the log alone.

use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug)]
pub struct EventLog<E> {
    entries: RwLock<Vec<E>>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<E: Clone> EventLog<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: E) {
        self.entries.write().push(event);
    }

    /// Copy of every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<E> {
        self.entries.read().clone()
    }

    pub fn last(&self) -> Option<E> {
        self.entries.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Hand the buffered events to an exporter and clear the buffer.
    pub fn drain(&self) -> Vec<E> {
        std::mem::take(&mut *self.entries.write())
    }
}

impl<E: Clone + Serialize> EventLog<E> {
    /// Newline-delimited JSON, one event per line.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let entries = self.entries.read();
        let mut out = String::new();
        for event in entries.iter() {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}
