//! Data models for the quiz.
//!
//! This module contains the core data structures shared by the scoring
//! engine, the progress store and the result report.

use crate::scoring::CategoryRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Accumulated points per category key for one resolution run.
pub type CategoryScoreMap = BTreeMap<String, u64>;

/// A named outcome of the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (e.g. `chinatown`).
    pub key: String,
    /// Human-readable name shown on the result card.
    pub name: String,
    /// Opaque reference to the result artwork.
    pub image: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Per-question selections, one slot per scored question.
///
/// Slot `q - 1` holds the answer to question ordinal `q`. On the wire an
/// unanswered slot is `-1`; any negative integer reads as unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<i64>", into = "Vec<i64>")]
pub struct AnswerVector(Vec<Option<usize>>);

impl AnswerVector {
    /// Sentinel used for unanswered slots in persisted form.
    pub const UNANSWERED: i64 = -1;

    /// Creates a vector of `len` unanswered slots.
    pub fn unanswered(len: usize) -> Self {
        Self(vec![None; len])
    }

    /// Builds a vector from its persisted integer form.
    pub fn from_raw(raw: &[i64]) -> Self {
        Self(
            raw.iter()
                .map(|&v| usize::try_from(v).ok())
                .collect(),
        )
    }

    /// Returns the persisted integer form.
    pub fn to_raw(&self) -> Vec<i64> {
        self.0
            .iter()
            .map(|slot| match slot {
                Some(i) => i64::try_from(*i).unwrap_or(Self::UNANSWERED),
                None => Self::UNANSWERED,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Answer for question ordinal `question` (1-based).
    pub fn get(&self, question: usize) -> Option<usize> {
        question
            .checked_sub(1)
            .and_then(|idx| self.0.get(idx).copied().flatten())
    }

    /// Records `option` for question ordinal `question` (1-based).
    ///
    /// Returns false when the ordinal is outside the vector.
    pub fn set(&mut self, question: usize, option: usize) -> bool {
        match question.checked_sub(1).and_then(|idx| self.0.get_mut(idx)) {
            Some(slot) => {
                *slot = Some(option);
                true
            }
            None => false,
        }
    }

    /// Pads with unanswered slots or truncates to exactly `len` slots.
    ///
    /// Only the progress restore path uses this; the engine rejects
    /// mismatched lengths instead.
    pub fn fit_to(&mut self, len: usize) {
        self.0.resize(len, None);
    }

    pub fn answered_count(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Iterates `(ordinal, answer)` pairs with 1-based ordinals.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        self.0.iter().enumerate().map(|(idx, slot)| (idx + 1, *slot))
    }
}

impl From<Vec<i64>> for AnswerVector {
    fn from(raw: Vec<i64>) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<AnswerVector> for Vec<i64> {
    fn from(answers: AnswerVector) -> Self {
        answers.to_raw()
    }
}

/// Counters for soft conditions absorbed during one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringDiagnostics {
    /// Questions skipped because no option was selected.
    pub unanswered: usize,
    /// Selected options with no entry in the scoring table.
    pub missing_entries: usize,
    /// Point awards addressed to a key outside the category registry.
    pub unknown_categories: usize,
}

impl ScoringDiagnostics {
    /// True when the table fully covered every answered question.
    pub fn is_clean(&self) -> bool {
        self.missing_entries == 0 && self.unknown_categories == 0
    }
}

/// Outcome of one resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Key of the winning category.
    pub winner: String,
    /// Final score of every registered category.
    pub scores: CategoryScoreMap,
    /// Every category that shared the maximum score, in key order.
    pub tied: Vec<String>,
    /// Soft conditions absorbed while scoring.
    pub diagnostics: ScoringDiagnostics,
}

impl Resolution {
    /// The winning score.
    pub fn max_score(&self) -> u64 {
        self.scores.get(&self.winner).copied().unwrap_or(0)
    }

    /// True when the winner was picked by the random tie-break.
    pub fn was_tie(&self) -> bool {
        self.tied.len() > 1
    }

    /// Scores sorted highest first, then by key.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .scores
            .iter()
            .map(|(key, score)| (key.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Metadata about one resolved run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the result was resolved.
    pub resolved_at: DateTime<Utc>,
    /// Number of scored questions.
    pub question_count: usize,
    /// Number of questions that had an answer.
    pub answered: usize,
    /// Seed of the tie-break generator, when one was fixed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// One row of the score table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub key: String,
    pub name: String,
    pub score: u64,
}

/// Shareable result card for a finished quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultReport {
    pub metadata: ReportMetadata,
    /// The winning category.
    pub category: Category,
    /// Every category, highest score first.
    pub scores: Vec<ScoreLine>,
    /// Other categories that tied with the winner.
    pub tied_with: Vec<String>,
    pub diagnostics: ScoringDiagnostics,
}

impl ResultReport {
    /// Builds a report, naming categories through `registry`.
    pub fn new(
        resolution: &Resolution,
        answers: &AnswerVector,
        seed: Option<u64>,
        registry: &CategoryRegistry,
    ) -> Self {
        let describe = |key: &str| {
            registry.get(key).cloned().unwrap_or_else(|| Category {
                key: key.to_string(),
                name: key.to_string(),
                image: String::new(),
            })
        };

        let scores = resolution
            .ranked()
            .into_iter()
            .map(|(key, score)| ScoreLine {
                key: key.to_string(),
                name: describe(key).name,
                score,
            })
            .collect();

        Self {
            metadata: ReportMetadata {
                resolved_at: Utc::now(),
                question_count: answers.len(),
                answered: answers.answered_count(),
                seed,
            },
            category: describe(&resolution.winner),
            scores,
            tied_with: resolution
                .tied
                .iter()
                .filter(|key| **key != resolution.winner)
                .cloned()
                .collect(),
            diagnostics: resolution.diagnostics,
        }
    }
}
