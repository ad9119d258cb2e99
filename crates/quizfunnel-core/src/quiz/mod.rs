mod answers;
mod definition;
mod machine;
mod progress;

pub use answers::{Answer, AnswerState};
pub use definition::{Question, QuizDefinition, QuizOption};
pub use machine::{QuizPhase, QuizStateMachine};
pub use progress::{ProgressStore, QuizProgress};
