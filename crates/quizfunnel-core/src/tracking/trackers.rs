use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use super::Tracker;

/// Writes every event to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl Tracker for LogTracker {
    fn track(&self, name: &str, properties: &Value) {
        tracing::info!(event = name, %properties, "tracked");
    }
}

/// Keeps events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracker {
    events: Rc<RefCell<Vec<(String, Value)>>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.borrow().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.borrow().iter().filter(|(n, _)| n == name).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Tracker for RecordingTracker {
    fn track(&self, name: &str, properties: &Value) {
        self.events
            .borrow_mut()
            .push((name.to_string(), properties.clone()));
    }
}
