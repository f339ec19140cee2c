//! HoodQuiz - personality quiz scoring.
//!
//! The core is [`scoring::resolve`]: it maps an answer vector to exactly one
//! category using a static scoring table, breaking ties uniformly at random
//! through a caller-supplied generator. Around it sit the data loaders, a
//! key-value progress store, the step-by-step quiz session and the result
//! card renderer.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod scoring;
pub mod session;
pub mod store;

pub use error::{QuizError, StoreError};
pub use models::{AnswerVector, Category, Resolution, ResultReport, ScoringDiagnostics};
pub use scoring::{resolve, AggregationEngine, CategoryRegistry, ScoringConfig, ScoringTable};
