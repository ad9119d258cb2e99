use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    /// Emoji or image reference rendered next to the text.
    #[serde(default)]
    pub media: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub multiple: bool,
    pub options: Vec<QuizOption>,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.option(option_id).is_some()
    }
}

/// Ordered, immutable list of questions.
///
/// Step numbering: 0 is the intro, `1..=len()` are the questions and
/// `len() + 1` is the offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    questions: Vec<Question>,
}

impl QuizDefinition {
    /// Build a validated definition.
    pub fn new(questions: Vec<Question>) -> Result<Self, ValidationError> {
        let def = Self { questions };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.questions.is_empty() {
            return Err(ValidationError::EmptyQuiz);
        }
        let mut seen = HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id.as_str()) {
                return Err(ValidationError::DuplicateQuestion(q.id.clone()));
            }
            if q.options.is_empty() {
                return Err(ValidationError::NoOptions(q.id.clone()));
            }
            let mut options = HashSet::new();
            for o in &q.options {
                if !options.insert(o.id.as_str()) {
                    return Err(ValidationError::DuplicateOption {
                        question: q.id.clone(),
                        option: o.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions (`N`).
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Step index of the offer screen (`N + 1`).
    pub fn offer_step(&self) -> usize {
        self.questions.len() + 1
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Question shown at a 1-based step, if the step is a question step.
    pub fn question_at_step(&self, step: usize) -> Option<&Question> {
        step.checked_sub(1).and_then(|i| self.questions.get(i))
    }

    /// The weight-loss funnel this crate ships with.
    pub fn default_funnel() -> Self {
        fn opt(id: &str, text: &str, media: &str) -> QuizOption {
            QuizOption {
                id: id.into(),
                text: text.into(),
                media: Some(media.into()),
            }
        }

        Self {
            questions: vec![
                Question {
                    id: "main_challenge".into(),
                    prompt: "Which of these situations most keeps you from the body you want?".into(),
                    subtitle: "Be completely honest with us".into(),
                    multiple: false,
                    options: vec![
                        opt("restrictive_diets", "I start diets but give up fast and gain it all back", "😔"),
                        opt("no_time", "I have no time to plan meals and end up eating anything", "⏰"),
                        opt("confusion", "So much information leaves me lost about what to eat", "🤔"),
                        opt("emotional_eating", "I take anxiety and stress out on food", "😰"),
                    ],
                },
                Question {
                    id: "symptoms".into(),
                    prompt: "Besides struggling to lose weight, do you notice any of these signs?".into(),
                    subtitle: "You can pick more than one".into(),
                    multiple: true,
                    options: vec![
                        opt("fatigue", "Constant tiredness and low energy", "😴"),
                        opt("metabolism", "Trouble losing weight", "🔴"),
                        opt("low_self_esteem", "Low self-esteem and body dissatisfaction", "😞"),
                        opt("hair_nails", "Hair loss, weak nails or dry skin", "💇‍♀️"),
                        opt("uncontrolled_hunger", "Uncontrolled hunger or binge eating", "🍽️"),
                        opt("sleep_issues", "Trouble sleeping or poor sleep quality", "🌙"),
                    ],
                },
                Question {
                    id: "commitment".into(),
                    prompt: "How willing are you to change habits for real, lasting results?".into(),
                    subtitle: "Be honest about your readiness".into(),
                    multiple: false,
                    options: vec![
                        opt("full_transformation", "I'm ready for a complete transformation!", "🔥"),
                        opt("gradual_change", "I want to start slowly but see visible results", "📈"),
                        opt("easy_path", "I need something very easy to follow", "✨"),
                    ],
                },
                Question {
                    id: "weight_loss_attempts".into(),
                    prompt: "How many times have you tried to lose weight in the last 2 years?".into(),
                    subtitle: "Be honest - this shapes your diagnosis".into(),
                    multiple: false,
                    options: vec![
                        opt("first_time", "This is my first serious attempt", "🆕"),
                        opt("few_times", "2-3 attempts without lasting success", "🔄"),
                        opt("many_times", "I've lost count of my attempts", "😓"),
                        opt("constant_struggle", "I'm in a constant fight with the scale", "⚖️"),
                    ],
                },
            ],
        }
    }
}
