//! Quiz progress flow.
//!
//! A session walks from the story opener (index 0) through questions
//! `1..=N`. Answering the last question resolves the winning category
//! exactly once and persists it.

use crate::catalog::{Question, QuestionCatalog};
use crate::error::{QuizError, Result};
use crate::models::{AnswerVector, Resolution};
use crate::scoring::AggregationEngine;
use crate::store::{KeyValueStore, ProgressStore};
use rand::Rng;
use tracing::{debug, info, warn};

/// What happened after an option was picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Moved on to the given question index.
    Advanced(usize),
    /// The quiz is over.
    Completed(Outcome),
}

/// The persisted result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Category key saved as the result.
    pub category: String,
    /// Engine output; `None` when the fallback category was used.
    pub resolution: Option<Resolution>,
}

pub struct QuizSession<S> {
    engine: AggregationEngine,
    store: ProgressStore<S>,
    catalog: Option<QuestionCatalog>,
    fallback_category: Option<String>,
    current: usize,
    answers: AnswerVector,
}

impl<S: KeyValueStore> QuizSession<S> {
    /// Rebuild the session from whatever progress `backend` holds.
    pub fn restore(engine: AggregationEngine, backend: S) -> Result<Self> {
        let question_count = engine.question_count();
        let store = ProgressStore::new(backend, question_count);

        let current = store.current_question()?.unwrap_or(0);
        let answers = store
            .answers()?
            .unwrap_or_else(|| AnswerVector::unanswered(question_count));

        debug!(
            "Restored session at question {} with {} answers",
            current,
            answers.answered_count()
        );

        Ok(Self {
            engine,
            store,
            catalog: None,
            fallback_category: None,
            current,
            answers,
        })
    }

    /// Attach question content, enabling option range checks.
    pub fn with_catalog(mut self, catalog: QuestionCatalog) -> Result<Self> {
        if catalog.question_count() != self.engine.question_count() {
            return Err(QuizError::config(format!(
                "catalog has {} questions but scoring expects {}",
                catalog.question_count(),
                self.engine.question_count()
            )));
        }
        self.catalog = Some(catalog);
        Ok(self)
    }

    /// Category to report when the scoring configuration is unusable.
    pub fn with_fallback(mut self, category: Option<String>) -> Self {
        self.fallback_category = category;
        self
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.engine.question_count()
    }

    /// Content of the current question, when a catalog is attached.
    pub fn current_question(&self) -> Option<&Question> {
        self.catalog.as_ref()?.get(self.current)
    }

    pub fn answers(&self) -> &AnswerVector {
        &self.answers
    }

    /// Result of an earlier completed run, if one was saved.
    pub fn existing_result(&self) -> Result<Option<String>> {
        self.store.result()
    }

    /// Pick `option` on the current question using the thread-local rng.
    pub fn select_option(&mut self, option: usize) -> Result<Step> {
        self.select_option_with(option, &mut rand::rng())
    }

    /// Pick `option` on the current question.
    pub fn select_option_with<R: Rng>(&mut self, option: usize, rng: &mut R) -> Result<Step> {
        self.check_option(option)?;

        if self.current > 0 {
            self.answers.set(self.current, option);
            self.store.save_answers(&self.answers)?;
        }

        if self.current < self.question_count() {
            self.current += 1;
            self.store.save_current_question(self.current)?;
            return Ok(Step::Advanced(self.current));
        }

        let outcome = self.complete(rng)?;
        self.store.save_result(&outcome.category)?;
        info!("Quiz complete: {}", outcome.category);
        Ok(Step::Completed(outcome))
    }

    /// Step back one question; the opener is the floor.
    pub fn back(&mut self) -> Result<usize> {
        if self.current > 0 {
            self.current -= 1;
            self.store.save_current_question(self.current)?;
        }
        Ok(self.current)
    }

    /// Drop all progress and the saved result.
    pub fn retry(&mut self) -> Result<()> {
        self.store.clear()?;
        self.reset_state();
        Ok(())
    }

    /// Start over from the opener with blank answers.
    pub fn again(&mut self) -> Result<()> {
        self.reset_state();
        self.store.save_current_question(self.current)?;
        self.store.save_answers(&self.answers)?;
        Ok(())
    }

    fn reset_state(&mut self) {
        self.current = 0;
        self.answers = AnswerVector::unanswered(self.question_count());
    }

    fn check_option(&self, option: usize) -> Result<()> {
        let Some(count) = self
            .catalog
            .as_ref()
            .and_then(|c| c.option_count(self.current))
        else {
            return Ok(());
        };

        if option >= count {
            return Err(QuizError::validation(format!(
                "question {} has {} options, got option {}",
                self.current, count, option
            )));
        }
        Ok(())
    }

    fn complete<R: Rng>(&self, rng: &mut R) -> Result<Outcome> {
        resolve_or_fallback(
            &self.engine,
            &self.answers,
            self.fallback_category.as_deref(),
            rng,
        )
    }
}

/// Resolve `answers`, substituting `fallback` for a configuration error.
///
/// Validation errors always propagate.
pub fn resolve_or_fallback<R: Rng>(
    engine: &AggregationEngine,
    answers: &AnswerVector,
    fallback: Option<&str>,
    rng: &mut R,
) -> Result<Outcome> {
    match engine.resolve_with(answers, rng) {
        Ok(resolution) => Ok(Outcome {
            category: resolution.winner.clone(),
            resolution: Some(resolution),
        }),
        Err(e) if e.is_configuration() => match fallback {
            Some(fallback) => {
                warn!("Scoring failed ({}), using fallback '{}'", e, fallback);
                Ok(Outcome {
                    category: fallback.to_string(),
                    resolution: None,
                })
            }
            None => Err(e),
        },
        Err(e) => Err(e),
    }
}
