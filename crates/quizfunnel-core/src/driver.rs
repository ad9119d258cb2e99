//! Async driver that plays scheduled tasks out in real time.
//!
//! Components only record deadlines; this loop sleeps on the tokio timer
//! until the next one and ticks the component, until nothing is pending.

use std::time::Duration;

use tokio::time::Instant;

use crate::events::Event;
use crate::funnel::Funnel;
use crate::quiz::QuizStateMachine;
use crate::timer::Clock;

/// Anything with deadlines that fire on `tick()`.
pub trait Tickable {
    fn next_deadline(&self) -> Option<u64>;
    fn tick(&mut self) -> Vec<Event>;
}

impl Tickable for QuizStateMachine {
    fn next_deadline(&self) -> Option<u64> {
        QuizStateMachine::next_deadline(self)
    }

    fn tick(&mut self) -> Vec<Event> {
        QuizStateMachine::tick(self)
    }
}

impl Tickable for Funnel {
    fn next_deadline(&self) -> Option<u64> {
        Funnel::next_deadline(self)
    }

    fn tick(&mut self) -> Vec<Event> {
        Funnel::tick(self)
    }
}

/// Clock that follows the tokio timer, so paused test runtimes stay in sync.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
    base_ms: u64,
}

impl TokioClock {
    pub fn new(base_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            base_ms,
        }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.base_ms + self.origin.elapsed().as_millis() as u64
    }
}

/// Tick `target` at each deadline until it has nothing scheduled.
///
/// Returns every event produced along the way.
pub async fn run_until_idle<T>(target: &mut T, clock: &dyn Clock) -> Vec<Event>
where
    T: Tickable + ?Sized,
{
    let mut events = Vec::new();
    while let Some(due) = target.next_deadline() {
        let now = clock.now_ms();
        if due > now {
            tokio::time::sleep(Duration::from_millis(due - now)).await;
        }
        events.extend(target.tick());
    }
    events
}

/// Like [`run_until_idle`] but gives up once `limit` has elapsed.
///
/// Needed for targets that keep a periodic task alive, such as the offer
/// countdown refresh.
pub async fn run_for<T>(target: &mut T, clock: &dyn Clock, limit: Duration) -> Vec<Event>
where
    T: Tickable + ?Sized,
{
    let deadline = clock.now_ms().saturating_add(limit.as_millis() as u64);
    let mut events = Vec::new();
    while let Some(due) = target.next_deadline() {
        if due > deadline {
            break;
        }
        let now = clock.now_ms();
        if due > now {
            tokio::time::sleep(Duration::from_millis(due - now)).await;
        }
        events.extend(target.tick());
    }
    events
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::quiz::{QuizDefinition, QuizPhase};
    use crate::storage::{FunnelConfig, KeyValueStore, MemoryStore, RevealSource, StorageKeys};

    #[tokio::test(start_paused = true)]
    async fn plays_auto_advance_and_loading() {
        let clock = TokioClock::new(1_000_000);
        let config = FunnelConfig::default();
        let mut machine = QuizStateMachine::restore(
            QuizDefinition::default_funnel(),
            config.quiz,
            config.loading,
            Rc::new(MemoryStore::new()),
            Rc::new(clock),
        );
        machine.start();
        machine.answer("main_challenge", "no_time");
        run_until_idle(&mut machine, &clock).await;
        assert_eq!(machine.current_step(), 2);

        machine.answer("symptoms", "fatigue");
        machine.next_step();
        machine.answer("commitment", "easy_path");
        run_until_idle(&mut machine, &clock).await;
        machine.answer("weight_loss_attempts", "few_times");
        let events = run_until_idle(&mut machine, &clock).await;

        assert_eq!(machine.phase(), QuizPhase::Offer);
        assert!(!machine.is_loading());
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::LoadingStarted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn run_for_stops_at_limit() {
        let clock = TokioClock::new(0);
        let mut funnel = Funnel::new(
            QuizDefinition::default_funnel(),
            FunnelConfig::default(),
            Rc::new(MemoryStore::new()),
            Rc::new(clock),
        );
        funnel.mount(None);
        funnel.start();
        funnel.answer("main_challenge", "confusion");
        run_for(&mut funnel, &clock, Duration::from_secs(1)).await;
        funnel.answer("symptoms", "metabolism");
        funnel.next();
        funnel.answer("commitment", "full_transformation");
        run_for(&mut funnel, &clock, Duration::from_secs(1)).await;
        funnel.answer("weight_loss_attempts", "many_times");
        run_for(&mut funnel, &clock, Duration::from_secs(6)).await;
        assert_eq!(funnel.phase(), QuizPhase::Offer);
        assert_eq!(funnel.countdown_text(), "20:00");
        run_for(&mut funnel, &clock, Duration::from_secs(3)).await;
        assert_eq!(funnel.countdown_text(), "19:57");
    }

    #[tokio::test(start_paused = true)]
    async fn timer_reveal_fires_with_expired_countdown() {
        let clock = TokioClock::new(3_600_000);
        let store = Rc::new(MemoryStore::new());
        let keys = StorageKeys::default();
        store.set(&keys.quiz_step(), "5").unwrap();
        store.set(&keys.countdown_start(), "0").unwrap();
        let mut config = FunnelConfig::default();
        config.reveal.source = RevealSource::Timer;
        config.reveal.threshold_secs = 10.0;
        let mut funnel = Funnel::new(
            QuizDefinition::default_funnel(),
            config,
            store,
            Rc::new(clock),
        );
        funnel.mount(None);
        assert!(funnel.next_deadline().is_some());

        run_for(&mut funnel, &clock, Duration::from_secs(60)).await;
        assert!(funnel.gate().is_revealed());
        assert!(funnel.is_checkout_unlocked());
    }
}
