//! # Quiz Funnel Core Library
//!
//! Core logic for a marketing quiz funnel: an intro screen, a short quiz, a
//! simulated "processing" screen and a video sales offer whose checkout
//! links unlock once enough of the video has been watched. A standalone CLI
//! binary drives the same library from a terminal.
//!
//! ## Architecture
//!
//! - **Quiz**: a wall-clock state machine that persists every transition and
//!   requires the caller to periodically invoke `tick()` for delayed work
//! - **Storage**: pluggable key-value persistence (in-memory, SQLite) and
//!   TOML-based configuration
//! - **Offer**: reveal gate, countdown, playback resume and personalized copy
//! - **Tracking**: analytics hub fanning events out to trackers
//!
//! ## Key Components
//!
//! - [`QuizStateMachine`]: step, answers and loading animation
//! - [`RevealGate`]: latch controlling offer visibility
//! - [`CountdownTimer`]: persisted offer deadline
//! - [`Funnel`]: all of the above composed for one visit
//! - [`FunnelConfig`]: application configuration management

pub mod driver;
pub mod error;
pub mod events;
pub mod funnel;
pub mod offer;
pub mod playback;
pub mod quiz;
pub mod reveal;
pub mod storage;
pub mod timer;
pub mod tracking;

pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::{Event, StepDirection};
pub use funnel::Funnel;
pub use offer::{checkout_unlocked, Diagnosis};
pub use playback::PlaybackTracker;
pub use quiz::{Answer, AnswerState, QuizDefinition, QuizPhase, QuizProgress, QuizStateMachine};
pub use reveal::{ProcessingBanner, RevealGate};
pub use storage::{FunnelConfig, KeyValueStore, MemoryStore, SqliteStore, StorageKeys};
pub use timer::{Clock, CountdownTimer, ManualClock, SystemClock};
pub use tracking::{Analytics, LogTracker, RecordingTracker, Tracker};
