//! Quiz state machine.
//!
//! Tracks the visitor's step through the funnel, the collected answers and
//! the simulated processing screen. Every mutation is persisted immediately.
//! Delayed transitions are scheduled, not slept on: the owner calls `tick()`
//! periodically and due tasks fire.
//!
//! ## State Transitions
//!
//! ```text
//! Intro(0) -> Question(1..=N) -> Loading(N, is_loading) -> Offer(N+1)
//! ```
//!
//! Back navigation (when enabled) only moves between question steps and
//! never below step 1.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::answers::AnswerState;
use super::definition::{Question, QuizDefinition};
use super::progress::{ProgressStore, QuizProgress};
use crate::events::{completion_percentage, timestamp, Event, StepDirection};
use crate::storage::{KeyValueStore, LoadingConfig, QuizConfig, StorageKeys};
use crate::timer::{Clock, LoadingAnimation, LoadingStage, Scheduler};

/// Screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "question_index", rename_all = "snake_case")]
pub enum QuizPhase {
    Intro,
    /// Zero-based index into the definition's questions.
    Question(usize),
    Loading,
    Offer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizTask {
    /// Advance after a single-select answer, unless the visitor moved on.
    AutoAdvance { from_step: usize },
    LoadingTick { due_ms: u64 },
    LoadingFinished,
}

pub struct QuizStateMachine {
    definition: QuizDefinition,
    quiz_config: QuizConfig,
    loading_config: LoadingConfig,
    persistence: ProgressStore,
    clock: Rc<dyn Clock>,
    progress: QuizProgress,
    scheduler: Scheduler<QuizTask>,
    loading: Option<LoadingAnimation>,
}

impl QuizStateMachine {
    /// Restore the machine from storage.
    ///
    /// A persisted loading flag means the page was reloaded mid-animation;
    /// the animation restarts from 0 so the visitor still reaches the offer.
    pub fn restore(
        definition: QuizDefinition,
        quiz_config: QuizConfig,
        loading_config: LoadingConfig,
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let persistence = ProgressStore::new(store, StorageKeys::new(quiz_config.key_prefix.clone()));
        let progress = persistence.load(&definition);
        let mut machine = Self {
            definition,
            quiz_config,
            loading_config,
            persistence,
            clock,
            progress,
            scheduler: Scheduler::new(),
            loading: None,
        };
        if machine.progress.is_loading {
            tracing::debug!("resuming interrupted loading animation");
            machine.begin_animation();
        }
        machine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn definition(&self) -> &QuizDefinition {
        &self.definition
    }

    pub fn progress(&self) -> &QuizProgress {
        &self.progress
    }

    pub fn current_step(&self) -> usize {
        self.progress.current_step
    }

    pub fn answers(&self) -> &AnswerState {
        &self.progress.answers
    }

    pub fn is_loading(&self) -> bool {
        self.progress.is_loading
    }

    pub fn phase(&self) -> QuizPhase {
        let step = self.progress.current_step;
        if self.progress.is_loading {
            QuizPhase::Loading
        } else if step == 0 {
            QuizPhase::Intro
        } else if step >= self.definition.offer_step() {
            QuizPhase::Offer
        } else {
            QuizPhase::Question(step - 1)
        }
    }

    /// Question on screen, if any.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase() {
            QuizPhase::Question(_) => self.definition.question_at_step(self.progress.current_step),
            _ => None,
        }
    }

    pub fn is_answered(&self, question: &Question) -> bool {
        self.progress.answers.is_answered(question)
    }

    /// Header percentage for the question screens.
    pub fn completion_pct(&self) -> u64 {
        completion_percentage(
            self.progress.current_step.min(self.definition.len()),
            self.definition.len(),
        )
    }

    /// 0-100 value of the processing animation.
    pub fn loading_progress(&self) -> u8 {
        match self.phase() {
            QuizPhase::Offer => 100,
            QuizPhase::Loading => self.loading.as_ref().map_or(0, |a| a.progress()),
            _ => 0,
        }
    }

    pub fn loading_stage(&self) -> LoadingStage {
        LoadingStage::for_progress(self.loading_progress())
    }

    /// Earliest pending deadline, for drivers that sleep between ticks.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.scheduler.is_empty()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Leave the intro screen.
    pub fn start(&mut self) -> Vec<Event> {
        if self.progress.current_step != 0 {
            return Vec::new();
        }
        self.next_step()
    }

    /// Record a selection for the question on screen.
    ///
    /// Multi-select questions toggle the option and stay put. Single-select
    /// questions replace the value and schedule an advance after the
    /// configured delay. Ids that do not belong to the current question are
    /// ignored.
    pub fn answer(&mut self, question_id: &str, option_id: &str) -> Vec<Event> {
        let multiple = match self.current_question() {
            Some(q) if q.id == question_id && q.has_option(option_id) => q.multiple,
            _ => {
                tracing::debug!(question_id, option_id, "ignoring answer outside current step");
                return Vec::new();
            }
        };

        let step = self.progress.current_step;
        self.progress.answers = if multiple {
            self.progress.answers.toggle(question_id, option_id)
        } else {
            self.progress.answers.set(question_id, option_id)
        };
        self.persist();

        if !multiple {
            self.cancel_auto_advance();
            let due = self.clock.now_ms() + self.quiz_config.auto_advance_delay_ms;
            self.scheduler
                .schedule(due, QuizTask::AutoAdvance { from_step: step });
        }

        vec![Event::QuestionAnswered {
            question_id: question_id.to_string(),
            answer_id: option_id.to_string(),
            current_step: step,
            total_steps: self.definition.len(),
            is_multiple: multiple,
            at: self.now(),
        }]
    }

    /// Move forward one screen.
    ///
    /// From the last question this starts the loading animation instead of
    /// jumping to the offer.
    pub fn next_step(&mut self) -> Vec<Event> {
        if self.progress.is_loading {
            return Vec::new();
        }
        let n = self.definition.len();
        let step = self.progress.current_step;
        if step < n {
            self.cancel_auto_advance();
            self.progress.current_step = step + 1;
            self.persist();
            tracing::debug!(from = step, to = step + 1, "quiz step advanced");
            vec![self.step_changed(StepDirection::Next)]
        } else if step == n {
            self.start_loading()
        } else {
            Vec::new()
        }
    }

    /// Step back one question, when enabled by configuration.
    pub fn back(&mut self) -> Vec<Event> {
        if !self.quiz_config.allow_back || self.progress.is_loading {
            return Vec::new();
        }
        let step = self.progress.current_step;
        if step < 2 || step > self.definition.len() {
            return Vec::new();
        }
        self.cancel_auto_advance();
        self.progress.current_step = step - 1;
        self.persist();
        vec![self.step_changed(StepDirection::Previous)]
    }

    /// Enter the simulated processing screen from the last question.
    ///
    /// Idempotent while the animation is running.
    pub fn start_loading(&mut self) -> Vec<Event> {
        let n = self.definition.len();
        if self.progress.current_step != n || (self.progress.is_loading && self.loading.is_some()) {
            return Vec::new();
        }
        self.cancel_auto_advance();
        self.progress.is_loading = true;
        self.persist();
        self.begin_animation();
        vec![Event::LoadingStarted { at: self.now() }]
    }

    /// Fire every scheduled task that is due.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        loop {
            let due = self.scheduler.take_due(now);
            if due.is_empty() {
                break;
            }
            for (_, task) in due {
                match task {
                    QuizTask::AutoAdvance { from_step } => {
                        if from_step == self.progress.current_step && !self.progress.is_loading {
                            events.extend(self.next_step());
                        }
                    }
                    QuizTask::LoadingTick { due_ms } => {
                        if let Some(anim) = self.loading.as_mut() {
                            if anim.advance() < 100 {
                                let next = due_ms + self.loading_config.tick_interval_ms;
                                self.scheduler
                                    .schedule(next, QuizTask::LoadingTick { due_ms: next });
                            }
                        }
                    }
                    QuizTask::LoadingFinished => events.extend(self.finish_loading()),
                }
            }
        }
        events
    }

    /// Clear answers and return to the intro screen.
    pub fn restart(&mut self) -> Vec<Event> {
        self.teardown();
        self.progress = QuizProgress::default();
        self.persist();
        vec![Event::StepChanged {
            new_step: 0,
            total_steps: self.definition.len(),
            direction: StepDirection::Previous,
            at: self.now(),
        }]
    }

    /// Cancel every outstanding task. Persisted state is left as is.
    pub fn teardown(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        self.loading = None;
        if cancelled > 0 {
            tracing::debug!(cancelled, "quiz tasks cancelled on teardown");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_animation(&mut self) {
        self.scheduler
            .cancel_where(|t| matches!(t, QuizTask::LoadingTick { .. } | QuizTask::LoadingFinished));
        self.loading = Some(LoadingAnimation::new(&self.loading_config));
        let now = self.clock.now_ms();
        let first = now + self.loading_config.tick_interval_ms;
        self.scheduler
            .schedule(first, QuizTask::LoadingTick { due_ms: first });
        self.scheduler
            .schedule(now + self.loading_config.duration_ms, QuizTask::LoadingFinished);
    }

    fn finish_loading(&mut self) -> Vec<Event> {
        if !self.progress.is_loading {
            return Vec::new();
        }
        self.scheduler
            .cancel_where(|t| matches!(t, QuizTask::LoadingTick { .. }));
        if let Some(anim) = self.loading.as_mut() {
            anim.finish();
        }
        self.progress.is_loading = false;
        self.progress.current_step = self.definition.offer_step();
        self.persist();
        tracing::debug!("loading finished, offer unlocked");
        vec![self.step_changed(StepDirection::Next)]
    }

    fn cancel_auto_advance(&mut self) {
        self.scheduler
            .cancel_where(|t| matches!(t, QuizTask::AutoAdvance { .. }));
    }

    fn step_changed(&self, direction: StepDirection) -> Event {
        Event::StepChanged {
            new_step: self.progress.current_step,
            total_steps: self.definition.len(),
            direction,
            at: self.now(),
        }
    }

    fn persist(&self) {
        self.persistence.save(&self.progress);
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        timestamp(self.clock.now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::ManualClock;

    fn machine_with(config: QuizConfig) -> (QuizStateMachine, ManualClock, Rc<MemoryStore>) {
        let store = Rc::new(MemoryStore::new());
        let clock = ManualClock::new(1_000_000);
        let machine = QuizStateMachine::restore(
            QuizDefinition::default_funnel(),
            config,
            LoadingConfig::default(),
            store.clone(),
            Rc::new(clock.clone()),
        );
        (machine, clock, store)
    }

    fn machine() -> (QuizStateMachine, ManualClock, Rc<MemoryStore>) {
        machine_with(QuizConfig::default())
    }

    #[test]
    fn start_leaves_intro() {
        let (mut m, _, _) = machine();
        assert_eq!(m.phase(), QuizPhase::Intro);
        assert_eq!(m.start().len(), 1);
        assert_eq!(m.phase(), QuizPhase::Question(0));
        // Only valid from the intro.
        assert!(m.start().is_empty());
    }

    #[test]
    fn single_answer_advances_after_delay() {
        let (mut m, clock, store) = machine();
        m.start();
        m.answer("main_challenge", "no_time");
        assert_eq!(m.answers().single("main_challenge"), Some("no_time"));
        // Persisted before the delayed advance fires.
        assert_eq!(store.get("quizfunnel-quiz-step").unwrap().as_deref(), Some("1"));
        assert!(store
            .get("quizfunnel-quiz-answers")
            .unwrap()
            .unwrap()
            .contains("no_time"));

        clock.advance(499);
        assert!(m.tick().is_empty());
        assert_eq!(m.current_step(), 1);

        clock.advance(1);
        let events = m.tick();
        assert_eq!(events.len(), 1);
        assert_eq!(m.current_step(), 2);
    }

    #[test]
    fn reanswering_reschedules_single_advance() {
        let (mut m, clock, _) = machine();
        m.start();
        m.answer("main_challenge", "no_time");
        clock.advance(300);
        m.answer("main_challenge", "confusion");
        clock.advance(300);
        m.tick();
        assert_eq!(m.current_step(), 1);
        clock.advance(200);
        m.tick();
        assert_eq!(m.current_step(), 2);
        assert_eq!(m.answers().single("main_challenge"), Some("confusion"));
    }

    #[test]
    fn manual_next_before_delay_does_not_double_advance() {
        let (mut m, clock, _) = machine();
        m.start();
        m.answer("main_challenge", "no_time");
        m.next_step();
        assert_eq!(m.current_step(), 2);
        clock.advance(1_000);
        m.tick();
        assert_eq!(m.current_step(), 2);
    }

    #[test]
    fn multi_select_toggles_without_advancing() {
        let (mut m, clock, _) = machine();
        m.start();
        m.answer("main_challenge", "no_time");
        clock.advance(500);
        m.tick();
        assert_eq!(m.phase(), QuizPhase::Question(1));

        m.answer("symptoms", "fatigue");
        m.answer("symptoms", "sleep_issues");
        m.answer("symptoms", "fatigue");
        clock.advance(5_000);
        m.tick();
        assert_eq!(m.current_step(), 2);
        assert_eq!(m.answers().selected("symptoms"), ["sleep_issues".to_string()]);
        let q = m.current_question().unwrap().clone();
        assert!(m.is_answered(&q));
    }

    #[test]
    fn answers_for_other_steps_are_ignored() {
        let (mut m, _, _) = machine();
        assert!(m.answer("main_challenge", "no_time").is_empty());
        m.start();
        assert!(m.answer("symptoms", "fatigue").is_empty());
        assert!(m.answer("main_challenge", "bogus").is_empty());
        assert!(m.answers().is_empty());
        assert!(!m.has_pending_tasks());
    }

    #[test]
    fn last_question_goes_through_loading() {
        let (mut m, clock, store) = machine();
        m.start();
        for (q, o) in [
            ("main_challenge", "no_time"),
            ("symptoms", "fatigue"),
            ("commitment", "gradual_change"),
        ] {
            m.answer(q, o);
            if q == "symptoms" {
                m.next_step();
            } else {
                clock.advance(500);
                m.tick();
            }
        }
        assert_eq!(m.current_step(), 4);

        m.answer("weight_loss_attempts", "first_time");
        clock.advance(500);
        m.tick();
        assert_eq!(m.phase(), QuizPhase::Loading);
        assert_eq!(m.current_step(), 4);
        assert_eq!(store.get("quizfunnel-quiz-loading").unwrap().as_deref(), Some("true"));

        let mut last = 0;
        for _ in 0..49 {
            clock.advance(100);
            m.tick();
            assert!(m.loading_progress() >= last);
            last = m.loading_progress();
        }
        assert_eq!(m.phase(), QuizPhase::Loading);
        assert_eq!(last, 98);

        clock.advance(100);
        m.tick();
        assert_eq!(m.phase(), QuizPhase::Offer);
        assert_eq!(m.current_step(), 5);
        assert!(!m.is_loading());
        assert_eq!(m.loading_progress(), 100);
        assert!(!m.has_pending_tasks());
        assert_eq!(store.get("quizfunnel-quiz-loading").unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn start_loading_is_idempotent() {
        let (mut m, _, _) = machine();
        m.start();
        for _ in 0..3 {
            m.next_step();
        }
        assert_eq!(m.start_loading().len(), 1);
        let pending = m.next_deadline();
        assert!(m.start_loading().is_empty());
        assert!(m.next_step().is_empty());
        assert_eq!(m.next_deadline(), pending);
    }

    #[test]
    fn start_loading_requires_last_question() {
        let (mut m, _, _) = machine();
        m.start();
        assert!(m.start_loading().is_empty());
        assert!(!m.is_loading());
    }

    #[test]
    fn back_is_gated_by_config() {
        let (mut m, _, _) = machine();
        m.start();
        m.next_step();
        assert!(m.back().is_empty());
        assert_eq!(m.current_step(), 2);

        let (mut m, clock, _) = machine_with(QuizConfig {
            allow_back: true,
            ..QuizConfig::default()
        });
        m.start();
        assert!(m.back().is_empty(), "never below step 1");
        m.answer("main_challenge", "no_time");
        m.next_step();
        assert_eq!(m.back().len(), 1);
        assert_eq!(m.current_step(), 1);
        clock.advance(1_000);
        m.tick();
        assert_eq!(m.current_step(), 1);
    }

    #[test]
    fn teardown_cancels_everything() {
        let (mut m, clock, _) = machine();
        m.start();
        m.answer("main_challenge", "no_time");
        m.teardown();
        assert!(!m.has_pending_tasks());
        clock.advance(1_000);
        assert!(m.tick().is_empty());
        assert_eq!(m.current_step(), 1);
    }

    #[test]
    fn reload_mid_loading_resumes_animation() {
        let store = Rc::new(MemoryStore::new());
        store.set("quizfunnel-quiz-step", "4").unwrap();
        store.set("quizfunnel-quiz-loading", "true").unwrap();
        let clock = ManualClock::new(0);
        let mut m = QuizStateMachine::restore(
            QuizDefinition::default_funnel(),
            QuizConfig::default(),
            LoadingConfig::default(),
            store.clone(),
            Rc::new(clock.clone()),
        );
        assert_eq!(m.phase(), QuizPhase::Loading);
        assert!(m.has_pending_tasks());
        clock.advance(5_000);
        m.tick();
        assert_eq!(m.phase(), QuizPhase::Offer);
    }

    #[test]
    fn restart_clears_progress() {
        let (mut m, _, store) = machine();
        m.start();
        m.answer("main_challenge", "no_time");
        m.restart();
        assert_eq!(m.phase(), QuizPhase::Intro);
        assert!(m.answers().is_empty());
        assert!(!m.has_pending_tasks());
        assert_eq!(store.get("quizfunnel-quiz-step").unwrap().as_deref(), Some("0"));
    }
}
