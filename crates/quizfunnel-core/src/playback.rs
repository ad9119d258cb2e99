//! Watched-time bookkeeping for the offer video.
//!
//! Consumes the player's `(current_time, duration)` progress callback and its
//! `ended` signal. Keeps the monotonic watched time that feeds the reveal
//! gate, persists a resume position every few seconds and emits coarse
//! progress events.

use std::rc::Rc;

use crate::events::{timestamp, Event};
use crate::storage::{KeyValueStore, PlaybackConfig, StorageKeys};
use crate::timer::Clock;

/// Result of one progress callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackUpdate {
    /// New watched time, only when a new whole second was reached.
    pub watched_secs: Option<f64>,
    pub events: Vec<Event>,
}

pub struct PlaybackTracker {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    key: String,
    video_id: String,
    save_every_secs: u64,
    progress_step_pct: u8,
    watched_secs: f64,
    last_reported_second: Option<u64>,
    last_saved_second: Option<u64>,
    last_progress_pct: u8,
}

impl PlaybackTracker {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        keys: &StorageKeys,
        source_url: &str,
        video_id: &str,
        config: &PlaybackConfig,
    ) -> Self {
        let mut tracker = Self {
            store,
            clock,
            key: keys.player_time(source_url),
            video_id: video_id.to_string(),
            save_every_secs: config.save_every_secs.max(1),
            progress_step_pct: config.progress_event_step_pct.max(1),
            watched_secs: 0.0,
            last_reported_second: None,
            last_saved_second: None,
            last_progress_pct: 0,
        };
        tracker.watched_secs = tracker.saved_position();
        tracker
    }

    /// Resume position in seconds; 0 when missing or unreadable.
    pub fn saved_position(&self) -> f64 {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return 0.0,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to read resume position: {e}");
                return 0.0;
            }
        };
        match raw.trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => secs,
            _ => {
                tracing::warn!(key = %self.key, "malformed resume position {raw:?}");
                0.0
            }
        }
    }

    pub fn watched_secs(&self) -> f64 {
        self.watched_secs
    }

    pub fn on_progress(&mut self, current_secs: f64, duration_secs: f64) -> PlaybackUpdate {
        if !current_secs.is_finite() || current_secs < 0.0 {
            return PlaybackUpdate::default();
        }
        let second = current_secs.floor() as u64;
        if self.last_reported_second.is_some_and(|last| second <= last) {
            return PlaybackUpdate::default();
        }
        self.last_reported_second = Some(second);
        self.watched_secs = self.watched_secs.max(current_secs);

        if second % self.save_every_secs == 0
            && self.last_saved_second.map_or(true, |last| second > last)
        {
            self.last_saved_second = Some(second);
            self.save_position(current_secs);
        }

        let mut events = Vec::new();
        if duration_secs.is_finite() && duration_secs > 0.0 {
            let pct = ((current_secs / duration_secs) * 100.0).floor().min(100.0) as u8;
            if pct >= self.last_progress_pct.saturating_add(self.progress_step_pct) {
                self.last_progress_pct = pct;
                events.push(Event::VideoProgress {
                    video_id: self.video_id.clone(),
                    percentage_watched: pct,
                    current_time: second,
                    total_duration: duration_secs.floor() as u64,
                    at: timestamp(self.clock.now_ms()),
                });
            }
        }

        PlaybackUpdate {
            watched_secs: Some(self.watched_secs),
            events,
        }
    }

    /// Playback reached the end: forget the resume position.
    ///
    /// The per-second markers start over so a replay reports and saves from
    /// the beginning again. `watched_secs` keeps its maximum.
    pub fn on_ended(&mut self, duration_secs: f64) -> Vec<Event> {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, "failed to clear resume position: {e}");
        }
        if duration_secs.is_finite() && duration_secs > self.watched_secs {
            self.watched_secs = duration_secs;
        }
        self.last_reported_second = None;
        self.last_saved_second = None;
        self.last_progress_pct = 0;
        vec![Event::VideoCompleted {
            video_id: self.video_id.clone(),
            total_duration: duration_secs.max(0.0).floor() as u64,
            at: timestamp(self.clock.now_ms()),
        }]
    }

    fn save_position(&self, secs: f64) {
        if let Err(e) = self.store.set(&self.key, &secs.to_string()) {
            tracing::warn!(key = %self.key, "failed to save resume position: {e}");
        }
    }
}
