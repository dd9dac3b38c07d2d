//! adept-core: adaptive interview engine
//!
//! This crate provides:
//!
//! - **State machine** - [`InterviewMachine`] drives an [`InterviewState`] from
//!   introduction through questions, evaluation and a final report
//! - **Performance profile** - [`PerformanceProfile`] tracks scores, trend,
//!   strengths and weaknesses and decides how difficulty should move
//! - **Adaptive selection** - [`AdaptiveSelector`] picks the next corpus question
//! - **Answer evaluation** - [`AnswerEvaluator`] scores answers against a
//!   [`Rubric`] with the text generator, or heuristically when it is absent
//!   or returns something unparsable
//! - **Persistence** - [`SessionStore`] with in-memory and JSON-file backends
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use adept_core::{
//!     InterviewConfig, InterviewMachine, QuestionBank, SessionConfig, StateTag, StepAction,
//! };
//!
//! # async fn example() -> adept_core::Result<()> {
//! let bank = Arc::new(QuestionBank::load("questions.json".as_ref())?);
//! let machine = InterviewMachine::builder(bank)
//!     .config(InterviewConfig { require_generator: false, ..Default::default() })
//!     .build()?;
//!
//! let state = machine.start(SessionConfig::new().topic("Excel").total_questions(3))?;
//! let state = machine.step(&state, None).await?; // intro
//! let state = machine
//!     .step(&state, Some(StepAction::goto(StateTag::AskingQuestions)))
//!     .await?;
//! println!("{}", state.ui.current_message);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 InterviewMachine                 │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────┐  │
//! │  │ Adaptive     │ │ Answer       │ │ Summary  │  │
//! │  │ Selector     │ │ Evaluator    │ │ Writer   │  │
//! │  └──────┬───────┘ └──────┬───────┘ └────┬─────┘  │
//! │         └───── BoundedGenerator ───────┘         │
//! │  ProfileStore (session -> PerformanceProfile)    │
//! │  SessionStore (optional persistence)             │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod machine;
pub mod profile;
pub mod selector;
pub mod store;
pub mod summary;
pub mod types;

// Re-export key types for convenience
pub use config::InterviewConfig;
pub use corpus::{CategoryInfo, CorpusStats, QuestionBank, QuestionCorpus};
pub use error::{InterviewError, Result};
pub use evaluation::{AnswerEvaluator, Evaluation, Rubric};
pub use machine::{Adaptation, InterviewMachine, InterviewState, StateTag, StepAction};
pub use profile::{
    AdaptationLevel, InMemoryProfileStore, PerformanceProfile, ProfileInsights, ProfileStore,
    ProfileSummary, Trend,
};
pub use selector::AdaptiveSelector;
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore, SessionSummary};
pub use types::{Answer, Aspect, Difficulty, Question, Session, SessionConfig, SessionId};
