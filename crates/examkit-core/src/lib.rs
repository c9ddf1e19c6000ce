//! examkit-core — Exam-taking session engine.
//!
//! This crate holds the exam data model, the question type registry, answer
//! storage, navigation, timing, audio gating and submission encoding that a
//! test-taking front end drives.

pub mod answers;
pub mod api;
pub mod audio;
pub mod drag;
pub mod encoder;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod navigation;
pub mod notify;
pub mod passage;
pub mod prefs;
pub mod registry;
pub mod render;
pub mod route;
pub mod session;
pub mod table;
pub mod timer;
pub mod tokens;
pub mod validate;

pub use answers::{AnswerKey, AnswerStore, AnswerValue};
pub use error::SessionError;
pub use lifecycle::{DriverConfig, SessionDriver, SessionEvent, SubmitOutcome};
pub use model::{Exam, Question, QuestionKind, Section, SectionKind};
pub use session::SessionState;
