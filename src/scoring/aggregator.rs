//! Answer aggregation and winner resolution.
//!
//! This module turns an answer vector into per-category scores and picks
//! the winning category, breaking ties uniformly at random.

use crate::error::{QuizError, Result};
use crate::models::{AnswerVector, CategoryScoreMap, Resolution, ScoringDiagnostics};
use crate::scoring::table::{CategoryRegistry, ScoringConfig, ScoringTable};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolve `answers` to exactly one category.
///
/// Fails with a configuration error when `categories` is empty and with a
/// validation error when `answers` does not hold one slot per question.
/// Unanswered slots, missing table entries and unknown category keys are
/// absorbed and counted in the returned diagnostics.
pub fn resolve<R: Rng>(
    answers: &AnswerVector,
    table: &ScoringTable,
    categories: &CategoryRegistry,
    rng: &mut R,
) -> Result<Resolution> {
    if categories.is_empty() {
        return Err(QuizError::config("category registry is empty"));
    }

    if answers.len() != table.question_count() {
        return Err(QuizError::validation(format!(
            "expected {} answers, got {}",
            table.question_count(),
            answers.len()
        )));
    }

    let (scores, diagnostics) = accumulate(answers, table, categories);
    let tied = leaders(&scores);

    // Seeding every category at zero keeps `tied` non-empty.
    let winner = match tied.len() {
        0 => return Err(QuizError::config("no category could be scored")),
        1 => tied[0].clone(),
        n => {
            let pick = rng.random_range(0..n);
            debug!("Breaking {}-way tie, picked {}", n, tied[pick]);
            tied[pick].clone()
        }
    };

    Ok(Resolution {
        winner,
        scores,
        tied,
        diagnostics,
    })
}

/// Sum the points of every answered question into a fresh score map.
pub fn accumulate(
    answers: &AnswerVector,
    table: &ScoringTable,
    categories: &CategoryRegistry,
) -> (CategoryScoreMap, ScoringDiagnostics) {
    let mut scores: CategoryScoreMap = categories.keys().map(|k| (k.to_string(), 0)).collect();
    let mut diagnostics = ScoringDiagnostics::default();

    for (question, answer) in answers.iter() {
        let Some(option) = answer else {
            debug!("Question {} unanswered, skipping", question);
            diagnostics.unanswered += 1;
            continue;
        };

        let Some(points) = table.lookup(question, option) else {
            warn!(
                "No scoring entry for question {} option {}",
                question, option
            );
            diagnostics.missing_entries += 1;
            continue;
        };

        for (key, &value) in points.iter().filter(|(_, v)| **v > 0) {
            match scores.get_mut(key) {
                Some(total) => *total += u64::from(value),
                None => {
                    warn!(
                        "Question {} option {} awards {} to unknown category '{}'",
                        question, option, value, key
                    );
                    diagnostics.unknown_categories += 1;
                }
            }
        }
    }

    (scores, diagnostics)
}

/// Every key that holds the maximum score, in key order.
fn leaders(scores: &CategoryScoreMap) -> Vec<String> {
    let Some(max) = scores.values().copied().max() else {
        return Vec::new();
    };

    scores
        .iter()
        .filter(|(_, score)| **score == max)
        .map(|(key, _)| key.clone())
        .collect()
}

/// Shared, read-only handle over a loaded scoring configuration.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    config: Arc<ScoringConfig>,
}

impl AggregationEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Load the scoring configuration at `path`.
    ///
    /// With a `fallback` category, a configuration error degrades to an
    /// engine without categories, so every resolution reports the fallback.
    pub fn load(path: &Path, question_count: usize, fallback: Option<&str>) -> Result<Self> {
        match ScoringConfig::load(path, question_count) {
            Ok(config) => Ok(Self::new(config)),
            Err(e) if e.is_configuration() => match fallback {
                Some(fallback) => {
                    warn!("{}; results will use the fallback category '{}'", e, fallback);
                    Ok(Self::new(ScoringConfig {
                        categories: CategoryRegistry::default(),
                        table: ScoringTable::new(question_count),
                    }))
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn question_count(&self) -> usize {
        self.config.table.question_count()
    }

    /// Resolve with a caller-supplied random source.
    pub fn resolve_with<R: Rng>(
        &self,
        answers: &AnswerVector,
        rng: &mut R,
    ) -> Result<Resolution> {
        resolve(answers, &self.config.table, &self.config.categories, rng)
    }

    /// Resolve with the thread-local random source.
    pub fn resolve(&self, answers: &AnswerVector) -> Result<Resolution> {
        self.resolve_with(answers, &mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::scoring::table::OptionScores;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn small_config() -> ScoringConfig {
        ScoringConfig::from_json_str(include_str!("../../fixtures/scoring_small.json"), 2).unwrap()
    }

    fn points(pairs: &[(&str, u32)]) -> OptionScores {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn registry(keys: &[&str]) -> CategoryRegistry {
        CategoryRegistry::new(keys.iter().map(|k| Category {
            key: k.to_string(),
            name: k.to_uppercase(),
            image: String::new(),
        }))
    }

    #[test]
    fn test_unique_winner() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(7);
        let answers = AnswerVector::from_raw(&[0, 0]);

        let resolution = resolve(&answers, &config.table, &config.categories, &mut rng).unwrap();

        assert_eq!(resolution.winner, "A");
        assert_eq!(resolution.scores["A"], 3);
        assert_eq!(resolution.scores["B"], 0);
        assert_eq!(resolution.scores["C"], 1);
        assert!(!resolution.was_tie());
        assert!(resolution.diagnostics.is_clean());
    }

    #[test]
    fn test_tie_excludes_lower_scores() {
        let config = small_config();
        let answers = AnswerVector::from_raw(&[0, 1]);

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolution =
                resolve(&answers, &config.table, &config.categories, &mut rng).unwrap();
            assert_eq!(resolution.tied, vec!["A".to_string(), "C".to_string()]);
            assert_ne!(resolution.winner, "B");
            assert_eq!(resolution.max_score(), 2);
        }
    }

    #[test]
    fn test_seeded_tie_break_is_reproducible() {
        let config = small_config();
        let answers = AnswerVector::from_raw(&[0, 1]);

        let first = resolve(
            &answers,
            &config.table,
            &config.categories,
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
        let second = resolve(
            &answers,
            &config.table,
            &config.categories,
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();

        assert_eq!(first.winner, second.winner);
    }

    #[test]
    fn test_determinism_without_ties() {
        let engine = AggregationEngine::new(small_config());
        let answers = AnswerVector::from_raw(&[0, 0]);

        assert!((0..20).all(|_| engine.resolve(&answers).unwrap().winner == "A"));
    }

    #[test]
    fn test_all_unanswered_ties_every_category() {
        let config = small_config();
        let answers = AnswerVector::unanswered(2);
        let mut rng = StdRng::seed_from_u64(1);

        let resolution = resolve(&answers, &config.table, &config.categories, &mut rng).unwrap();

        assert_eq!(resolution.tied.len(), 3);
        assert_eq!(resolution.max_score(), 0);
        assert_eq!(resolution.diagnostics.unanswered, 2);
        assert!(config.categories.contains(&resolution.winner));
    }

    #[test]
    fn test_tie_fairness() {
        let config = small_config();
        let answers = AnswerVector::unanswered(2);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts: HashMap<String, usize> = HashMap::new();
        let runs = 3000;

        for _ in 0..runs {
            let resolution =
                resolve(&answers, &config.table, &config.categories, &mut rng).unwrap();
            *counts.entry(resolution.winner).or_default() += 1;
        }

        assert_eq!(counts.len(), 3);
        for (key, count) in &counts {
            // Expected 1000 each; allow a wide statistical margin.
            assert!(
                (800..=1200).contains(count),
                "category {} picked {} times out of {}",
                key,
                count,
                runs
            );
        }
    }

    #[test]
    fn test_empty_registry_is_configuration_error() {
        let table = ScoringTable::new(2);
        let err = resolve(
            &AnswerVector::from_raw(&[0, 0]),
            &table,
            &CategoryRegistry::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_length_mismatch_is_validation_error() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(0);

        for raw in [vec![0], vec![0, 0, 0]] {
            let err = resolve(
                &AnswerVector::from_raw(&raw),
                &config.table,
                &config.categories,
                &mut rng,
            )
            .unwrap_err();
            assert!(matches!(err, QuizError::Validation(_)));
        }
    }

    #[test]
    fn test_missing_entry_and_out_of_range_option_are_absorbed() {
        let config = small_config();
        let answers = AnswerVector::from_raw(&[0, 9]);
        let mut rng = StdRng::seed_from_u64(0);

        let resolution = resolve(&answers, &config.table, &config.categories, &mut rng).unwrap();

        assert_eq!(resolution.winner, "A");
        assert_eq!(resolution.scores["A"], 2);
        assert_eq!(resolution.diagnostics.missing_entries, 1);
    }

    #[test]
    fn test_unknown_category_is_absorbed() {
        let categories = registry(&["a", "b"]);
        let mut table = ScoringTable::new(1);
        table
            .insert(1, 0, points(&[("a", 1), ("ghost", 10)]))
            .unwrap();

        let resolution = resolve(
            &AnswerVector::from_raw(&[0]),
            &table,
            &categories,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();

        assert_eq!(resolution.winner, "a");
        assert!(!resolution.scores.contains_key("ghost"));
        assert_eq!(resolution.diagnostics.unknown_categories, 1);
    }

    #[test]
    fn test_zero_entry_matches_absent_entry() {
        let categories = registry(&["a", "b"]);
        let mut sparse = ScoringTable::new(2);
        sparse.insert(1, 0, points(&[("b", 3)])).unwrap();

        let mut padded = sparse.clone();
        padded.insert(2, 1, points(&[("a", 0), ("b", 0)])).unwrap();

        let answers = AnswerVector::from_raw(&[0, 1]);
        let (sparse_scores, _) = accumulate(&answers, &sparse, &categories);
        let (padded_scores, _) = accumulate(&answers, &padded, &categories);

        assert_eq!(sparse_scores, padded_scores);

        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            resolve(&answers, &sparse, &categories, &mut rng).unwrap().winner,
            resolve(&answers, &padded, &categories, &mut rng).unwrap().winner
        );
    }

    #[test]
    fn test_raising_points_breaks_tie() {
        let config = small_config();
        let answers = AnswerVector::from_raw(&[0, 1]);
        let mut table = config.table.clone();
        table.insert(2, 1, points(&[("C", 3)])).unwrap();

        let resolution = resolve(
            &answers,
            &table,
            &config.categories,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();

        assert_eq!(resolution.winner, "C");
        assert_eq!(resolution.tied, vec!["C".to_string()]);
    }

    #[test]
    fn test_result_is_always_registered() {
        let config = small_config();
        let engine = AggregationEngine::new(config.clone());
        let vectors = [[-1, -1], [0, -1], [-1, 1], [1, 0], [1, 1], [0, 0], [0, 1]];

        for raw in vectors {
            let resolution = engine.resolve(&AnswerVector::from_raw(&raw)).unwrap();
            assert!(config.categories.contains(&resolution.winner));
        }
    }

    #[test]
    fn test_load_reads_table() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/scoring_small.json");
        let engine = AggregationEngine::load(&path, 2, Some("A")).unwrap();
        assert_eq!(engine.config().categories.len(), 3);
    }

    #[test]
    fn test_load_degrades_to_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scoring.json");
        std::fs::write(&path, r#"{"neighborhoods": {}}"#).unwrap();

        let engine = AggregationEngine::load(&path, 2, Some("chinatown")).unwrap();
        assert!(engine.config().categories.is_empty());
        assert_eq!(engine.question_count(), 2);

        let err = engine.resolve(&AnswerVector::unanswered(2)).unwrap_err();
        assert!(err.is_configuration());

        let outcome = crate::session::resolve_or_fallback(
            &engine,
            &AnswerVector::unanswered(2),
            Some("chinatown"),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(outcome.category, "chinatown");
        assert!(outcome.resolution.is_none());
    }

    #[test]
    fn test_load_without_fallback_fails() {
        let missing = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/missing.json");
        let err = AggregationEngine::load(&missing, 2, None).unwrap_err();
        assert!(err.is_configuration());
    }
}
