//! Personalized offer content and checkout visibility.
//!
//! Maps the collected answers onto the diagnosis blocks shown above the
//! checkout links. Unknown or missing answers fall back to neutral content.

use serde::Serialize;

use crate::quiz::{AnswerState, QuizDefinition, QuizPhase};

/// Main obstacle block, keyed by the `main_challenge` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeProfile {
    pub id: &'static str,
    pub headline: &'static str,
    pub problem: &'static str,
    pub solution: &'static str,
}

/// One extra benefit, keyed by a `symptoms` selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Benefit {
    pub symptom: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallToAction {
    pub id: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptsNote {
    RepeatedAttempts,
    FreshStart,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub challenge: ChallengeProfile,
    pub attempts: AttemptsNote,
    pub benefits: Vec<Benefit>,
    pub cta: CallToAction,
}

const CHALLENGES: &[ChallengeProfile] = &[
    ChallengeProfile {
        id: "restrictive_diets",
        headline: "Restrictive diet cycle",
        problem: "Your body switches to saving mode and you regain everything afterwards.",
        solution: "The plan calculates your exact calories without going hungry.",
    },
    ChallengeProfile {
        id: "no_time",
        headline: "Lack of time",
        problem: "In the rush you eat anything and lose control.",
        solution: "Meals planned in seconds plus logging by photo.",
    },
    ChallengeProfile {
        id: "confusion",
        headline: "Too much information",
        problem: "Conflicting advice leaves you unsure what to do.",
        solution: "A simple step-by-step method with an assistant telling you exactly what to do.",
    },
    ChallengeProfile {
        id: "emotional_eating",
        headline: "Emotional hunger",
        problem: "Anxiety turns into extra calories without you noticing.",
        solution: "Identify triggers and break the cycle.",
    },
];

const FALLBACK_CHALLENGE: &str = "confusion";

const BENEFITS: &[Benefit] = &[
    Benefit {
        symptom: "fatigue",
        text: "More energy during the day",
    },
    Benefit {
        symptom: "low_self_esteem",
        text: "Self-esteem way up",
    },
    Benefit {
        symptom: "uncontrolled_hunger",
        text: "Hunger under control",
    },
    Benefit {
        symptom: "sleep_issues",
        text: "Deeper sleep",
    },
];

const CTAS: &[CallToAction] = &[
    CallToAction {
        id: "full_transformation",
        text: "I want my transformation now",
    },
    CallToAction {
        id: "gradual_change",
        text: "Start at my own pace",
    },
];

const DEFAULT_CTA: CallToAction = CallToAction {
    id: "default",
    text: "See how it works",
};

impl Diagnosis {
    pub fn from_answers(definition: &QuizDefinition, answers: &AnswerState) -> Self {
        let challenge = answers
            .single("main_challenge")
            .and_then(challenge_profile)
            .or_else(|| challenge_profile(FALLBACK_CHALLENGE))
            .unwrap_or(CHALLENGES[0]);

        let attempts = match answers.single("weight_loss_attempts") {
            Some("many_times") | Some("constant_struggle") => AttemptsNote::RepeatedAttempts,
            Some("first_time") => AttemptsNote::FreshStart,
            _ => AttemptsNote::None,
        };

        // Definition order, not selection order.
        let benefits = match definition.question("symptoms") {
            Some(question) => answers
                .selected_in_order(question)
                .into_iter()
                .filter_map(|o| BENEFITS.iter().find(|b| b.symptom == o.id).copied())
                .collect(),
            None => Vec::new(),
        };

        let cta = answers
            .single("commitment")
            .and_then(|id| CTAS.iter().find(|c| c.id == id).copied())
            .unwrap_or(DEFAULT_CTA);

        Self {
            challenge,
            attempts,
            benefits,
            cta,
        }
    }
}

fn challenge_profile(id: &str) -> Option<ChallengeProfile> {
    CHALLENGES.iter().find(|c| c.id == id).copied()
}

/// Checkout links show only on the settled offer screen with the gate open.
pub fn checkout_unlocked(phase: QuizPhase, revealed: bool) -> bool {
    phase == QuizPhase::Offer && revealed
}
