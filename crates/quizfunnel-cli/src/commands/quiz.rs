use std::rc::Rc;

use clap::Subcommand;
use quizfunnel_core::driver::run_until_idle;
use quizfunnel_core::timer::LoadingStage;
use quizfunnel_core::{
    Analytics, Clock, Diagnosis, Event, LogTracker, QuizDefinition, QuizPhase, QuizStateMachine,
    StorageKeys, SystemClock,
};
use serde_json::{json, Value};

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum QuizAction {
    /// Print the current quiz state as JSON
    Status,
    /// Leave the intro screen
    Start,
    /// Answer the question on screen
    Answer {
        /// Question id (e.g. "main_challenge")
        question: String,
        /// Option id (e.g. "no_time")
        option: String,
    },
    /// Move to the next screen
    Next,
    /// Go back one question (requires quiz.allow_back)
    Back,
    /// Clear answers and return to the intro
    Reset,
}

pub async fn run(action: QuizAction) -> CliResult {
    let (config, store) = open()?;
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let mut machine = QuizStateMachine::restore(
        QuizDefinition::default_funnel(),
        config.quiz.clone(),
        config.loading.clone(),
        store.clone(),
        clock.clone(),
    );

    let mut events = match action {
        QuizAction::Status => return print_json(&status(&machine)),
        QuizAction::Start => machine.start(),
        QuizAction::Answer { question, option } => {
            let is_current = machine
                .current_question()
                .is_some_and(|q| q.id == question && q.has_option(&option));
            if !is_current {
                return Err(
                    format!("{question}/{option} is not an option on the current screen").into(),
                );
            }
            machine.answer(&question, &option)
        }
        QuizAction::Next => machine.next_step(),
        QuizAction::Back => machine.back(),
        QuizAction::Reset => machine.restart(),
    };

    events.extend(run_until_idle(&mut machine, clock.as_ref()).await);

    // Only visits that change the quiz count as a page view.
    let mut analytics = Analytics::new(
        store,
        clock,
        StorageKeys::new(config.quiz.key_prefix.clone()),
    )
    .with_tracker(LogTracker);
    analytics.init(None);
    analytics.track_all(&events);

    print_json(&json!({
        "events": events.iter().map(event_json).collect::<Vec<_>>(),
        "state": status(&machine),
    }))
}

fn event_json(event: &Event) -> Value {
    json!({ "name": event.name(), "properties": event.properties() })
}

fn status(machine: &QuizStateMachine) -> Value {
    let definition = machine.definition();
    let mut value = json!({
        "phase": machine.phase(),
        "current_step": machine.current_step(),
        "total_steps": definition.len(),
        "completion_pct": machine.completion_pct(),
        "is_loading": machine.is_loading(),
        "answers": machine.answers(),
    });
    if let Some(question) = machine.current_question() {
        value["question"] = json!({
            "id": question.id,
            "prompt": question.prompt,
            "multiple": question.multiple,
            "answered": machine.is_answered(question),
            "options": question
                .options
                .iter()
                .map(|o| json!({
                    "id": o.id,
                    "text": o.text,
                    "selected": machine.answers().contains(&question.id, &o.id),
                }))
                .collect::<Vec<_>>(),
        });
    }
    match machine.phase() {
        QuizPhase::Loading => {
            let stage: LoadingStage = machine.loading_stage();
            value["loading"] = json!({
                "progress": machine.loading_progress(),
                "stage": stage,
                "label": stage.label(),
            });
        }
        QuizPhase::Offer => {
            value["diagnosis"] = json!(Diagnosis::from_answers(definition, machine.answers()));
        }
        _ => {}
    }
    value
}
