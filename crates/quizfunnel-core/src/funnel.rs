//! Page composition: quiz, processing screen, offer video, reveal gate,
//! countdown and analytics wired together.
//!
//! The funnel owns every component instance for one visit. All operations
//! forward the events they produce to [`Analytics`] and also return them, so
//! front ends can render transitions without querying again.

use std::rc::Rc;

use crate::events::{timestamp, Event};
use crate::offer::{checkout_unlocked, Diagnosis};
use crate::playback::PlaybackTracker;
use crate::quiz::{QuizDefinition, QuizPhase, QuizStateMachine};
use crate::reveal::{ProcessingBanner, RevealGate};
use crate::storage::{CheckoutLink, FunnelConfig, KeyValueStore, RevealSource, StorageKeys};
use crate::timer::{Clock, CountdownTimer, Scheduler};
use crate::tracking::{Analytics, Tracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunnelTask {
    CountdownRefresh,
    RevealDue,
}

pub struct Funnel {
    config: FunnelConfig,
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    keys: StorageKeys,
    machine: QuizStateMachine,
    gate: RevealGate,
    countdown: CountdownTimer,
    countdown_text: String,
    playback: Option<PlaybackTracker>,
    analytics: Analytics,
    scheduler: Scheduler<FunnelTask>,
    offer_entered_at: Option<u64>,
}

impl Funnel {
    /// Restore a visit from storage. Nothing is tracked until [`Funnel::mount`].
    pub fn new(
        definition: QuizDefinition,
        config: FunnelConfig,
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let keys = StorageKeys::new(config.quiz.key_prefix.clone());
        let machine = QuizStateMachine::restore(
            definition,
            config.quiz.clone(),
            config.loading.clone(),
            store.clone(),
            clock.clone(),
        );
        let countdown = CountdownTimer::new(
            store.clone(),
            clock.clone(),
            &keys,
            config.countdown.duration_ms,
        );
        let analytics = Analytics::new(store.clone(), clock.clone(), keys.clone());
        Self {
            gate: RevealGate::new(&config.reveal),
            config,
            store,
            clock,
            keys,
            machine,
            countdown,
            countdown_text: String::new(),
            playback: None,
            analytics,
            scheduler: Scheduler::new(),
            offer_entered_at: None,
        }
    }

    pub fn with_tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.analytics.add_tracker(tracker);
        self
    }

    /// Attach the offer video. Its saved resume position counts as watched.
    pub fn with_video(mut self, source_url: &str, video_id: &str) -> Self {
        let tracker = PlaybackTracker::new(
            self.store.clone(),
            self.clock.clone(),
            &self.keys,
            source_url,
            video_id,
            &self.config.playback,
        );
        if self.config.reveal.source == RevealSource::Video {
            self.gate.should_reveal(tracker.watched_secs());
        }
        self.playback = Some(tracker);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn machine(&self) -> &QuizStateMachine {
        &self.machine
    }

    pub fn gate(&self) -> &RevealGate {
        &self.gate
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn phase(&self) -> QuizPhase {
        self.machine.phase()
    }

    pub fn banner(&self) -> ProcessingBanner {
        self.gate.banner()
    }

    pub fn diagnosis(&self) -> Diagnosis {
        Diagnosis::from_answers(self.machine.definition(), self.machine.answers())
    }

    pub fn is_checkout_unlocked(&self) -> bool {
        checkout_unlocked(self.machine.phase(), self.gate.is_revealed())
    }

    /// Visible checkout links; empty while locked.
    pub fn checkout_links(&self) -> &[CheckoutLink] {
        if self.is_checkout_unlocked() {
            &self.config.offer.checkout
        } else {
            &[]
        }
    }

    /// Last value produced by the per-second refresh.
    pub fn countdown_text(&self) -> &str {
        &self.countdown_text
    }

    /// Fresh `MM:SS` reading of the countdown.
    pub fn countdown_display(&mut self) -> String {
        self.countdown.display()
    }

    pub fn countdown_remaining_ms(&mut self) -> u64 {
        self.countdown.remaining_now()
    }

    /// Earliest pending deadline of any component.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.machine.next_deadline(), self.scheduler.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Initialize analytics and pick up a visit that already reached the offer.
    pub fn mount(&mut self, landing_url: Option<&str>) -> Vec<Event> {
        self.analytics.init(landing_url);
        self.settle(Vec::new())
    }

    pub fn start(&mut self) -> Vec<Event> {
        let events = self.machine.start();
        self.settle(events)
    }

    pub fn answer(&mut self, question_id: &str, option_id: &str) -> Vec<Event> {
        let events = self.machine.answer(question_id, option_id);
        self.settle(events)
    }

    pub fn next(&mut self) -> Vec<Event> {
        let events = self.machine.next_step();
        self.settle(events)
    }

    pub fn back(&mut self) -> Vec<Event> {
        let events = self.machine.back();
        self.settle(events)
    }

    pub fn restart(&mut self) -> Vec<Event> {
        self.scheduler.cancel_all();
        self.offer_entered_at = None;
        let events = self.machine.restart();
        self.settle(events)
    }

    /// Player progress callback.
    pub fn on_video_progress(&mut self, current_secs: f64, duration_secs: f64) -> Vec<Event> {
        let Some(playback) = self.playback.as_mut() else {
            return Vec::new();
        };
        let update = playback.on_progress(current_secs, duration_secs);
        if let Some(watched) = update.watched_secs {
            if self.config.reveal.source == RevealSource::Video {
                self.gate.should_reveal(watched);
            }
        }
        self.emit(update.events)
    }

    pub fn on_video_ended(&mut self, duration_secs: f64) -> Vec<Event> {
        let Some(playback) = self.playback.as_mut() else {
            return Vec::new();
        };
        let events = playback.on_ended(duration_secs);
        let watched = playback.watched_secs();
        if self.config.reveal.source == RevealSource::Video {
            self.gate.should_reveal(watched);
        }
        self.emit(events)
    }

    /// Fire every due task across the composed components.
    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.machine.tick();
        let events = self.settle(events);

        let now = self.clock.now_ms();
        for (_, task) in self.scheduler.take_due(now) {
            match task {
                FunnelTask::CountdownRefresh => self.refresh_countdown(now),
                FunnelTask::RevealDue => self.reveal_after_timer(now),
            }
        }
        events
    }

    /// Record a checkout click. Returns the link to follow, if visible.
    pub fn click_checkout(&mut self, offer_id: &str) -> Option<CheckoutLink> {
        let link = self
            .checkout_links()
            .iter()
            .find(|l| l.id == offer_id)
            .cloned()?;
        self.analytics.track(&Event::CheckoutClicked {
            offer_id: link.id.clone(),
            price: link.price,
            at: timestamp(self.clock.now_ms()),
        });
        Some(link)
    }

    /// Cancel every outstanding task. Persisted state is kept.
    pub fn teardown(&mut self) {
        self.machine.teardown();
        self.scheduler.cancel_all();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Track `events` and react to reaching the offer step.
    fn settle(&mut self, mut events: Vec<Event>) -> Vec<Event> {
        if self.machine.phase() == QuizPhase::Offer && self.offer_entered_at.is_none() {
            events.extend(self.enter_offer());
        }
        self.emit(events)
    }

    fn enter_offer(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        self.offer_entered_at = Some(now);
        self.countdown.get_or_init_start();
        self.refresh_countdown(now);
        if self.config.reveal.source == RevealSource::Timer && !self.gate.is_revealed() {
            let delay_ms = (self.gate.threshold_secs() * 1000.0).ceil() as u64;
            self.scheduler
                .schedule(now.saturating_add(delay_ms), FunnelTask::RevealDue);
        }
        tracing::debug!("offer screen entered");
        vec![Event::OfferViewed { at: timestamp(now) }]
    }

    fn refresh_countdown(&mut self, now: u64) {
        self.countdown_text = self.countdown.display();
        if !self.countdown.is_expired() {
            self.scheduler.schedule(
                now + self.config.countdown.tick_interval_ms.max(1),
                FunnelTask::CountdownRefresh,
            );
        }
    }

    fn reveal_after_timer(&mut self, now: u64) {
        let Some(entered) = self.offer_entered_at else {
            return;
        };
        let elapsed_secs = now.saturating_sub(entered) as f64 / 1000.0;
        self.gate.should_reveal(elapsed_secs);
    }

    fn emit(&self, events: Vec<Event>) -> Vec<Event> {
        self.analytics.track_all(&events);
        events
    }
}
