use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Next,
    Previous,
}

/// Every funnel moment worth tracking produces an Event.
/// Components return them; the page composition forwards them to trackers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PageView {
        page_name: String,
        at: DateTime<Utc>,
    },
    QuestionAnswered {
        question_id: String,
        answer_id: String,
        current_step: usize,
        total_steps: usize,
        is_multiple: bool,
        at: DateTime<Utc>,
    },
    StepChanged {
        new_step: usize,
        total_steps: usize,
        direction: StepDirection,
        at: DateTime<Utc>,
    },
    /// Last question answered; the simulated processing screen is showing.
    LoadingStarted {
        at: DateTime<Utc>,
    },
    OfferViewed {
        at: DateTime<Utc>,
    },
    CheckoutClicked {
        offer_id: String,
        price: Option<f64>,
        at: DateTime<Utc>,
    },
    VideoProgress {
        video_id: String,
        percentage_watched: u8,
        current_time: u64,
        total_duration: u64,
        at: DateTime<Utc>,
    },
    VideoCompleted {
        video_id: String,
        total_duration: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Display name sent to analytics collaborators.
    pub fn name(&self) -> &'static str {
        match self {
            Event::PageView { .. } => "Page View",
            Event::QuestionAnswered { .. } => "Question Answered",
            Event::StepChanged { .. } => "Step Changed",
            Event::LoadingStarted { .. } => "Loading Started",
            Event::OfferViewed { .. } => "Offer Page Viewed",
            Event::CheckoutClicked { .. } => "Checkout Clicked",
            Event::VideoProgress { .. } => "Video Progress",
            Event::VideoCompleted { .. } => "Video Completed",
        }
    }

    /// Property bag: the event's fields minus the tag, plus derived values.
    pub fn properties(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("type");
            let completion = match self {
                Event::QuestionAnswered {
                    current_step,
                    total_steps,
                    ..
                } => Some(completion_percentage(*current_step, *total_steps)),
                Event::StepChanged {
                    new_step,
                    total_steps,
                    ..
                } => Some(completion_percentage(*new_step, *total_steps)),
                _ => None,
            };
            if let Some(pct) = completion {
                obj.insert("completion_percentage".into(), pct.into());
            }
            match self {
                Event::OfferViewed { .. } => {
                    obj.insert("page_type".into(), "sales_page".into());
                    obj.insert("funnel_step".into(), "offer_presentation".into());
                }
                Event::CheckoutClicked { .. } => {
                    obj.insert("funnel_step".into(), "checkout_intent".into());
                }
                _ => {}
            }
        }
        value
    }
}

/// `round(step / total * 100)`, 0 for an empty quiz.
pub fn completion_percentage(step: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }
    ((step as f64 / total as f64) * 100.0).round() as u64
}

/// Epoch milliseconds to a UTC timestamp.
pub(crate) fn timestamp(ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_drop_tag_and_add_completion() {
        let event = Event::QuestionAnswered {
            question_id: "main_challenge".into(),
            answer_id: "no_time".into(),
            current_step: 1,
            total_steps: 4,
            is_multiple: false,
            at: timestamp(0),
        };
        let props = event.properties();
        assert!(props.get("type").is_none());
        assert_eq!(props["question_id"], "main_challenge");
        assert_eq!(props["completion_percentage"], 25);
        assert_eq!(event.name(), "Question Answered");
    }

    #[test]
    fn step_changed_serializes_direction() {
        let event = Event::StepChanged {
            new_step: 3,
            total_steps: 4,
            direction: StepDirection::Previous,
            at: timestamp(1_000),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StepChanged");
        assert_eq!(json["direction"], "previous");
        assert_eq!(event.properties()["completion_percentage"], 75);
    }

    #[test]
    fn completion_percentage_rounds() {
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(5, 0), 0);
    }
}
