//! Collected answers and their pure update operations.
//!
//! Serialized as a JSON object mapping question id to either an option id
//! string (single-select) or an array of option ids (multi-select).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::definition::{Question, QuizDefinition, QuizOption};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    /// Treated as a set; order carries no meaning.
    Multiple(Vec<String>),
}

impl Answer {
    pub fn contains(&self, option_id: &str) -> bool {
        match self {
            Answer::Single(id) => id == option_id,
            Answer::Multiple(ids) => ids.iter().any(|id| id == option_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Single(_) => false,
            Answer::Multiple(ids) => ids.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerState(BTreeMap<String, Answer>);

impl AnswerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.0.get(question_id)
    }

    /// The single selection for a question, if it holds one.
    pub fn single(&self, question_id: &str) -> Option<&str> {
        match self.0.get(question_id) {
            Some(Answer::Single(id)) => Some(id),
            _ => None,
        }
    }

    /// The multi-select set for a question; empty if none.
    pub fn selected(&self, question_id: &str) -> &[String] {
        match self.0.get(question_id) {
            Some(Answer::Multiple(ids)) => ids,
            _ => &[],
        }
    }

    pub fn contains(&self, question_id: &str, option_id: &str) -> bool {
        self.0
            .get(question_id)
            .is_some_and(|a| a.contains(option_id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// New state with `option_id` flipped in the question's set.
    ///
    /// Removes the option if present, appends it otherwise. A previous
    /// single-select value for the question is discarded.
    pub fn toggle(&self, question_id: &str, option_id: &str) -> Self {
        let mut next = self.0.clone();
        let mut ids = match next.remove(question_id) {
            Some(Answer::Multiple(ids)) => ids,
            _ => Vec::new(),
        };
        if let Some(pos) = ids.iter().position(|id| id == option_id) {
            ids.remove(pos);
        } else {
            ids.push(option_id.to_string());
        }
        next.insert(question_id.to_string(), Answer::Multiple(ids));
        Self(next)
    }

    /// New state with the question's single value replaced.
    pub fn set(&self, question_id: &str, option_id: &str) -> Self {
        let mut next = self.0.clone();
        next.insert(
            question_id.to_string(),
            Answer::Single(option_id.to_string()),
        );
        Self(next)
    }

    /// Whether the question counts as answered.
    pub fn is_answered(&self, question: &Question) -> bool {
        match self.0.get(&question.id) {
            Some(Answer::Multiple(ids)) if question.multiple => !ids.is_empty(),
            Some(Answer::Single(_)) if !question.multiple => true,
            _ => false,
        }
    }

    /// Selected options in the question's display order.
    pub fn selected_in_order<'q>(&self, question: &'q Question) -> Vec<&'q QuizOption> {
        question
            .options
            .iter()
            .filter(|o| self.contains(&question.id, &o.id))
            .collect()
    }

    /// Drop anything that does not fit the definition: unknown questions,
    /// unknown options, and values whose shape does not match the question.
    pub fn sanitized(&self, definition: &QuizDefinition) -> Self {
        let mut clean = BTreeMap::new();
        for (question_id, answer) in &self.0 {
            let Some(question) = definition.question(question_id) else {
                continue;
            };
            match answer {
                Answer::Single(id) if !question.multiple && question.has_option(id) => {
                    clean.insert(question_id.clone(), answer.clone());
                }
                Answer::Multiple(ids) if question.multiple => {
                    let mut kept: Vec<String> = Vec::with_capacity(ids.len());
                    for id in ids {
                        if question.has_option(id) && !kept.contains(id) {
                            kept.push(id.clone());
                        }
                    }
                    clean.insert(question_id.clone(), Answer::Multiple(kept));
                }
                _ => {}
            }
        }
        Self(clean)
    }
}
