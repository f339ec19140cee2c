//! Quiz progress persistence.
//!
//! Progress lives under three keys: the current question index, the
//! answer vector and the resolved result. `ProgressStore` gives typed
//! access to them on top of any `KeyValueStore`.

pub mod backend;

pub use backend::{JsonFileStore, KeyValueStore, MemoryStore};

use crate::error::Result;
use crate::models::AnswerVector;
use tracing::{debug, warn};

pub const CURRENT_QUESTION_KEY: &str = "currentQuestion";
pub const ANSWERS_KEY: &str = "answerArray";
pub const RESULT_KEY: &str = "quizResult";

/// Typed progress access for a quiz of `question_count` questions.
#[derive(Debug)]
pub struct ProgressStore<S> {
    backend: S,
    question_count: usize,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(backend: S, question_count: usize) -> Self {
        Self {
            backend,
            question_count,
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Saved question index, if present and within `0..=N`.
    pub fn current_question(&self) -> Result<Option<usize>> {
        let Some(raw) = self.backend.get(CURRENT_QUESTION_KEY)? else {
            return Ok(None);
        };

        match raw.trim().parse::<usize>() {
            Ok(index) if index <= self.question_count => Ok(Some(index)),
            _ => {
                warn!("Ignoring saved question index '{}'", raw);
                Ok(None)
            }
        }
    }

    pub fn save_current_question(&mut self, index: usize) -> Result<()> {
        self.backend
            .set(CURRENT_QUESTION_KEY, &index.to_string())?;
        Ok(())
    }

    /// Saved answers fitted to N slots, if present and parseable.
    pub fn answers(&self) -> Result<Option<AnswerVector>> {
        let Some(raw) = self.backend.get(ANSWERS_KEY)? else {
            return Ok(None);
        };

        let mut answers: AnswerVector = match serde_json::from_str(&raw) {
            Ok(answers) => answers,
            Err(e) => {
                warn!("Ignoring unreadable saved answers: {}", e);
                return Ok(None);
            }
        };

        if answers.len() != self.question_count {
            debug!(
                "Fitting saved answers from {} to {} slots",
                answers.len(),
                self.question_count
            );
            answers.fit_to(self.question_count);
        }

        Ok(Some(answers))
    }

    pub fn save_answers(&mut self, answers: &AnswerVector) -> Result<()> {
        let raw = serde_json::to_string(&answers.to_raw())
            .map_err(crate::error::StoreError::from)?;
        self.backend.set(ANSWERS_KEY, &raw)?;
        Ok(())
    }

    /// Category key of the last completed run.
    pub fn result(&self) -> Result<Option<String>> {
        Ok(self
            .backend
            .get(RESULT_KEY)?
            .filter(|key| !key.trim().is_empty()))
    }

    pub fn save_result(&mut self, category: &str) -> Result<()> {
        self.backend.set(RESULT_KEY, category)?;
        Ok(())
    }

    /// Forget everything, completed result included.
    pub fn clear(&mut self) -> Result<()> {
        self.backend.remove(CURRENT_QUESTION_KEY)?;
        self.backend.remove(ANSWERS_KEY)?;
        self.backend.remove(RESULT_KEY)?;
        Ok(())
    }
}
