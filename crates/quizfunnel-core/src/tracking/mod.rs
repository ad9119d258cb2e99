//! Analytics collaborator hub.
//!
//! The funnel never talks to an analytics vendor directly. It hands each
//! [`Event`] to [`Analytics`], which enriches it with the visitor's
//! attribution data and fans it out to every registered [`Tracker`].
//! Delivery, batching and retry are the tracker's business.

mod trackers;
mod utm;

pub use trackers::{LogTracker, RecordingTracker};
pub use utm::{UtmParams, CAPTURED_PARAMS};

use std::rc::Rc;

use serde_json::Value;
use uuid::Uuid;

use crate::events::{timestamp, Event};
use crate::storage::{KeyValueStore, StorageKeys};
use crate::timer::Clock;

/// Receives named events with a JSON property bag.
pub trait Tracker {
    fn track(&self, name: &str, properties: &Value);
}

pub struct Analytics {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    keys: StorageKeys,
    trackers: Vec<Box<dyn Tracker>>,
    initialized: bool,
    utm: UtmParams,
    lead_id: Option<String>,
}

impl Analytics {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, keys: StorageKeys) -> Self {
        Self {
            store,
            clock,
            keys,
            trackers: Vec::new(),
            initialized: false,
            utm: UtmParams::default(),
            lead_id: None,
        }
    }

    pub fn with_tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.add_tracker(tracker);
        self
    }

    pub fn add_tracker(&mut self, tracker: impl Tracker + 'static) {
        self.trackers.push(Box::new(tracker));
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn utm(&self) -> &UtmParams {
        &self.utm
    }

    pub fn lead_id(&self) -> Option<&str> {
        self.lead_id.as_deref()
    }

    /// Capture attribution, resolve the lead id and record the page view.
    ///
    /// Runs once; later calls return `false` and do nothing.
    pub fn init(&mut self, landing_url: Option<&str>) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;

        let captured = landing_url.map(UtmParams::from_url).unwrap_or_default();
        self.utm = if captured.is_empty() {
            self.saved_utm()
        } else {
            self.persist_json(&self.keys.utm_params(), &captured);
            captured
        };
        self.lead_id = Some(self.resolve_lead_id());

        tracing::info!(
            lead_id = self.lead_id.as_deref().unwrap_or_default(),
            utm_params = self.utm.iter().count(),
            "analytics initialized"
        );

        let page_name = landing_url
            .and_then(|u| url::Url::parse(u).ok())
            .map(|u| u.path().to_string())
            .unwrap_or_else(|| "/".to_string());
        self.track(&Event::PageView {
            page_name,
            at: timestamp(self.clock.now_ms()),
        });
        true
    }

    /// Forward one event to every tracker.
    pub fn track(&self, event: &Event) {
        if !self.initialized {
            tracing::warn!(event = event.name(), "analytics not initialized, dropping event");
            return;
        }
        let properties = self.enrich(event.properties());
        for tracker in &self.trackers {
            tracker.track(event.name(), &properties);
        }
    }

    pub fn track_all(&self, events: &[Event]) {
        for event in events {
            self.track(event);
        }
    }

    fn enrich(&self, mut properties: Value) -> Value {
        if let Some(obj) = properties.as_object_mut() {
            for (k, v) in self.utm.iter() {
                obj.entry(k.to_string()).or_insert_with(|| v.into());
            }
            if let Some(lead_id) = &self.lead_id {
                obj.insert("lead_id".into(), lead_id.as_str().into());
            }
        }
        properties
    }

    fn saved_utm(&self) -> UtmParams {
        let key = self.keys.utm_params();
        match self.store.get(&key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(%key, "malformed saved utm params: {e}");
                UtmParams::default()
            }),
            Ok(None) => UtmParams::default(),
            Err(e) => {
                tracing::warn!(%key, "failed to read utm params: {e}");
                UtmParams::default()
            }
        }
    }

    fn resolve_lead_id(&self) -> String {
        let key = self.keys.lead_id();
        match self.store.get(&key) {
            Ok(Some(raw)) if Uuid::parse_str(raw.trim()).is_ok() => return raw.trim().to_string(),
            Ok(_) => {}
            Err(e) => tracing::warn!(%key, "failed to read lead id: {e}"),
        }
        let id = Uuid::new_v4().to_string();
        if let Err(e) = self.store.set(&key, &id) {
            tracing::warn!(%key, "failed to save lead id: {e}");
        }
        id
    }

    fn persist_json(&self, key: &str, value: &UtmParams) {
        let result = serde_json::to_string(value)
            .map_err(crate::error::CoreError::from)
            .and_then(|raw| self.store.set(key, &raw).map_err(Into::into));
        if let Err(e) = result {
            tracing::warn!(%key, "failed to save utm params: {e}");
        }
    }
}
