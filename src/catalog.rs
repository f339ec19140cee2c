//! Question catalog loading.
//!
//! Questions come from a JSON object keyed by ordinal. Ordinal `0` is the
//! story opener, `1..=N` are the scored questions.

use crate::error::{QuizError, Result};
use crate::scoring::ScoringTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Display size hint for a question illustration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl fmt::Display for QuestionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionSize::Small => write!(f, "small"),
            QuestionSize::Medium => write!(f, "medium"),
            QuestionSize::Large => write!(f, "large"),
            QuestionSize::ExtraLarge => write!(f, "extra-large"),
        }
    }
}

/// A single illustrated question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Illustration reference, not interpreted here.
    pub image: String,
    #[serde(default)]
    pub size: QuestionSize,
    /// Prompt text.
    pub question: String,
    /// Option labels; the position is the option index.
    pub options: Vec<String>,
}

/// All questions of one quiz, opener included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    question_count: usize,
    questions: BTreeMap<usize, Question>,
}

impl QuestionCatalog {
    /// Load the catalog from a JSON file.
    pub fn load(path: &Path, question_count: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuizError::config(format!(
                "failed to read questions file {}: {}",
                path.display(),
                e
            ))
        })?;

        let catalog = Self::from_json_str(&content, question_count)?;
        info!(
            "Loaded {} questions from {}",
            catalog.questions.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse the catalog and check that every scored question is present.
    pub fn from_json_str(content: &str, question_count: usize) -> Result<Self> {
        let raw: BTreeMap<String, Question> = serde_json::from_str(content)
            .map_err(|e| QuizError::config(format!("malformed questions file: {}", e)))?;

        let mut questions = BTreeMap::new();
        for (key, question) in raw {
            let ordinal = key.trim().parse::<usize>().map_err(|_| {
                QuizError::config(format!("question key '{}' is not an ordinal", key))
            })?;
            if ordinal > question_count {
                return Err(QuizError::config(format!(
                    "question {} is beyond the configured {} questions",
                    ordinal, question_count
                )));
            }
            if questions.insert(ordinal, question).is_some() {
                return Err(QuizError::config(format!(
                    "question {} is listed more than once (key '{}')",
                    ordinal, key
                )));
            }
        }

        for ordinal in 1..=question_count {
            match questions.get(&ordinal) {
                None => {
                    return Err(QuizError::config(format!("question {} is missing", ordinal)))
                }
                Some(q) if q.options.is_empty() => {
                    return Err(QuizError::config(format!(
                        "question {} has no options",
                        ordinal
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            question_count,
            questions,
        })
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Question at `ordinal`; `0` is the opener.
    pub fn get(&self, ordinal: usize) -> Option<&Question> {
        self.questions.get(&ordinal)
    }

    /// Number of selectable options at `ordinal`.
    pub fn option_count(&self, ordinal: usize) -> Option<usize> {
        self.get(ordinal).map(|q| q.options.len())
    }

    /// Options a player can pick that have no scoring entry.
    ///
    /// Such options silently contribute nothing, which is almost always an
    /// authoring slip, so each one is logged.
    pub fn unscored_options(&self, table: &ScoringTable) -> Vec<(usize, usize)> {
        let mut unscored = Vec::new();

        for ordinal in 1..=self.question_count {
            let Some(count) = self.option_count(ordinal) else {
                continue;
            };
            for option in 0..count {
                if table.lookup(ordinal, option).is_none() {
                    warn!(
                        "Question {} option {} has no scoring entry",
                        ordinal, option
                    );
                    unscored.push((ordinal, option));
                }
            }
        }

        unscored
    }
}
