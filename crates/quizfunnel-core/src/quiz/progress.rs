//! Best-effort persistence of quiz progress.
//!
//! Three keys are written on every mutation: the step as a decimal string,
//! the answers as JSON and the loading flag as `"true"`/`"false"`. Reads
//! tolerate missing or malformed values key by key; nothing here returns an
//! error to the caller.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::answers::AnswerState;
use super::definition::QuizDefinition;
use crate::error::CoreError;
use crate::storage::{KeyValueStore, StorageKeys};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub current_step: usize,
    pub answers: AnswerState,
    pub is_loading: bool,
}

impl QuizProgress {
    /// Bring a restored value back inside the definition's bounds.
    ///
    /// Steps outside `[0, N+1]` reset to 0, answers are filtered to known
    /// ids, and the loading flag only survives on the last question step
    /// (a flag stored next to the offer step is folded back to step N).
    pub fn normalized(mut self, definition: &QuizDefinition) -> Self {
        let n = definition.len();
        if self.current_step > definition.offer_step() {
            tracing::warn!(
                step = self.current_step,
                "persisted quiz step out of range, resetting"
            );
            self.current_step = 0;
        }
        self.answers = self.answers.sanitized(definition);
        if self.is_loading {
            if self.current_step == definition.offer_step() {
                self.current_step = n;
            } else if self.current_step != n {
                self.is_loading = false;
            }
        }
        self
    }
}

pub struct ProgressStore {
    store: Rc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl ProgressStore {
    pub fn new(store: Rc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Restore progress, falling back to defaults for anything unreadable.
    pub fn load(&self, definition: &QuizDefinition) -> QuizProgress {
        let current_step = self
            .read(&self.keys.quiz_step())
            .and_then(|raw| match raw.trim().parse::<usize>() {
                Ok(step) => Some(step),
                Err(e) => {
                    tracing::warn!("malformed persisted quiz step {raw:?}: {e}");
                    None
                }
            })
            .unwrap_or(0);

        let answers = self
            .read(&self.keys.quiz_answers())
            .and_then(|raw| match serde_json::from_str::<AnswerState>(&raw) {
                Ok(answers) => Some(answers),
                Err(e) => {
                    tracing::warn!("malformed persisted quiz answers: {e}");
                    None
                }
            })
            .unwrap_or_default();

        let is_loading = self
            .read(&self.keys.quiz_loading())
            .is_some_and(|raw| raw == "true");

        QuizProgress {
            current_step,
            answers,
            is_loading,
        }
        .normalized(definition)
    }

    /// Write all three keys. Failures are logged and swallowed.
    pub fn save(&self, progress: &QuizProgress) {
        if let Err(e) = self.try_save(progress) {
            tracing::warn!("failed to save quiz progress: {e}");
        }
    }

    /// Remove the persisted progress keys.
    pub fn clear(&self) {
        for key in [
            self.keys.quiz_step(),
            self.keys.quiz_answers(),
            self.keys.quiz_loading(),
        ] {
            if let Err(e) = self.store.remove(&key) {
                tracing::warn!(key = %key, "failed to clear quiz progress: {e}");
            }
        }
    }

    fn try_save(&self, progress: &QuizProgress) -> Result<(), CoreError> {
        // Answers first: a failed write must not leave the step ahead of them.
        let answers = serde_json::to_string(&progress.answers)?;
        self.store.set(&self.keys.quiz_answers(), &answers)?;
        self.store
            .set(&self.keys.quiz_step(), &progress.current_step.to_string())?;
        self.store
            .set(&self.keys.quiz_loading(), &progress.is_loading.to_string())?;
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, "failed to read persisted value: {e}");
                None
            }
        }
    }
}
