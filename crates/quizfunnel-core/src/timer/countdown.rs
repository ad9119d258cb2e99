//! Persisted offer countdown.
//!
//! The origin timestamp is written once and reused across reloads, so the
//! deadline stays fixed for a visitor no matter how often the page mounts.

use std::rc::Rc;

use super::Clock;
use crate::storage::{KeyValueStore, StorageKeys};

pub struct CountdownTimer {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    key: String,
    duration_ms: u64,
    /// Origin for this session once resolved, even if it could not be stored.
    start_ms: Option<u64>,
}

impl CountdownTimer {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        keys: &StorageKeys,
        duration_ms: u64,
    ) -> Self {
        Self {
            store,
            clock,
            key: keys.countdown_start(),
            duration_ms,
            start_ms: None,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Read the persisted origin, creating and persisting it on first use.
    ///
    /// Missing or malformed values are replaced by "now". Storage failures are
    /// logged; the origin is then kept in memory for the rest of the session.
    pub fn get_or_init_start(&mut self) -> u64 {
        if let Some(start) = self.start_ms {
            return start;
        }

        let stored = match self.store.get(&self.key) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(start) => Some(start),
                Err(e) => {
                    tracing::warn!(key = %self.key, "malformed countdown start {raw:?}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to read countdown start: {e}");
                None
            }
        };

        let start = match stored {
            Some(start) => start,
            None => {
                let now = self.clock.now_ms();
                if let Err(e) = self.store.set(&self.key, &now.to_string()) {
                    tracing::warn!(key = %self.key, "failed to persist countdown start: {e}");
                }
                now
            }
        };
        self.start_ms = Some(start);
        start
    }

    /// Remaining milliseconds at the current clock reading.
    pub fn remaining_now(&mut self) -> u64 {
        let start = self.get_or_init_start();
        remaining(self.clock.now_ms(), start, self.duration_ms)
    }

    pub fn is_expired(&mut self) -> bool {
        self.remaining_now() == 0
    }

    /// `mm:ss` for the current remainder.
    pub fn display(&mut self) -> String {
        format_mm_ss(self.remaining_now())
    }

    /// Forget the origin so the next read starts a fresh countdown.
    pub fn reset(&mut self) {
        self.start_ms = None;
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, "failed to clear countdown start: {e}");
        }
    }
}

/// `max(0, start + duration - now)`, never more than `duration`.
pub fn remaining(now_ms: u64, start_ms: u64, duration_ms: u64) -> u64 {
    start_ms
        .saturating_add(duration_ms)
        .saturating_sub(now_ms)
        .min(duration_ms)
}

/// Format a remainder as zero-padded `mm:ss` (whole seconds, rounded down).
pub fn format_mm_ss(remaining_ms: u64) -> String {
    let total_secs = remaining_ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
