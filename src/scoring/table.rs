//! Scoring configuration: the category registry and the points table.
//!
//! The configuration is loaded once from a JSON file shaped like
//!
//! ```json
//! {
//!   "neighborhoods": { "mission": { "name": "The Mission", "image": "/result/mission.png" } },
//!   "scores": { "1": { "0": { "mission": 2 } } }
//! }
//! ```
//!
//! and is read-only afterwards.

use crate::error::{QuizError, Result};
use crate::models::Category;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Points awarded by one (question, option) pair, keyed by category.
pub type OptionScores = BTreeMap<String, u32>;

/// The closed set of valid outcomes, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: BTreeMap<String, Category>,
}

impl CategoryRegistry {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|c| (c.key.clone(), c))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.categories.contains_key(key)
    }

    /// Category keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }
}

/// Question ordinal → option index → category points.
///
/// Absent entries mean "contributes nothing"; they are never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringTable {
    question_count: usize,
    entries: BTreeMap<usize, BTreeMap<usize, OptionScores>>,
}

impl ScoringTable {
    /// Creates an empty table for questions `1..=question_count`.
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            entries: BTreeMap::new(),
        }
    }

    /// Number of scored questions (N).
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Adds or replaces the entry for `(question, option)`.
    pub fn insert(&mut self, question: usize, option: usize, scores: OptionScores) -> Result<()> {
        if question == 0 || question > self.question_count {
            return Err(QuizError::config(format!(
                "question {} is outside 1..={}",
                question, self.question_count
            )));
        }
        self.entries
            .entry(question)
            .or_default()
            .insert(option, scores);
        Ok(())
    }

    /// Points for `(question, option)`, if the table has an entry.
    pub fn lookup(&self, question: usize, option: usize) -> Option<&OptionScores> {
        self.entries.get(&question)?.get(&option)
    }

    /// Option indices that carry an entry for `question`.
    pub fn scored_options(&self, question: usize) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .get(&question)
            .into_iter()
            .flat_map(|options| options.keys().copied())
    }

    /// Iterates every `(question, option, scores)` entry.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, &OptionScores)> {
        self.entries.iter().flat_map(|(q, options)| {
            options
                .iter()
                .map(move |(opt, scores)| (*q, *opt, scores))
        })
    }
}

/// Everything the aggregation engine needs, loaded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    pub categories: CategoryRegistry,
    pub table: ScoringTable,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScoring {
    #[serde(alias = "categories")]
    neighborhoods: BTreeMap<String, RawCategory>,
    #[serde(default)]
    scores: BTreeMap<String, BTreeMap<String, OptionScores>>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    name: String,
    #[serde(default)]
    image: String,
}

impl ScoringConfig {
    /// Load and validate the scoring configuration from a JSON file.
    pub fn load(path: &Path, question_count: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuizError::config(format!(
                "failed to read scoring file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_json_str(&content, question_count)?;
        info!(
            "Loaded scoring table from {} ({} categories, {} questions)",
            path.display(),
            config.categories.len(),
            question_count
        );
        Ok(config)
    }

    /// Parse and validate the scoring configuration from JSON text.
    pub fn from_json_str(content: &str, question_count: usize) -> Result<Self> {
        let raw: RawScoring = serde_json::from_str(content)
            .map_err(|e| QuizError::config(format!("malformed scoring table: {}", e)))?;

        if question_count == 0 {
            return Err(QuizError::config("question count must be at least 1"));
        }

        let categories = CategoryRegistry::new(raw.neighborhoods.into_iter().map(|(key, c)| {
            Category {
                key,
                name: c.name,
                image: c.image,
            }
        }));

        if categories.is_empty() {
            return Err(QuizError::config("scoring table defines no categories"));
        }

        let mut table = ScoringTable::new(question_count);
        let mut seen_questions = BTreeSet::new();
        for (question_key, options) in raw.scores {
            let question = parse_index(&question_key, "question")?;
            if !seen_questions.insert(question) {
                return Err(QuizError::config(format!(
                    "question {} is listed more than once (key '{}')",
                    question, question_key
                )));
            }
            for (option_key, scores) in options {
                let option = parse_index(&option_key, "option")?;
                if table.lookup(question, option).is_some() {
                    return Err(QuizError::config(format!(
                        "question {} option {} is listed more than once (key '{}')",
                        question, option, option_key
                    )));
                }
                for key in scores.keys().filter(|k| !categories.contains(k)) {
                    warn!(
                        "Scoring entry Q{} option {} awards points to unknown category '{}'",
                        question, option, key
                    );
                }
                table.insert(question, option, scores)?;
            }
        }

        for question in 1..=question_count {
            if table.scored_options(question).next().is_none() {
                warn!("Question {} has no scoring entries", question);
            }
        }

        debug!("Scoring table has {} entries", table.entries().count());

        Ok(Self { categories, table })
    }
}

fn parse_index(key: &str, what: &str) -> Result<usize> {
    key.trim()
        .parse::<usize>()
        .map_err(|_| QuizError::config(format!("{} key '{}' is not a non-negative integer", what, key)))
}
