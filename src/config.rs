//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.hoodquiz.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".hoodquiz.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Quiz data settings.
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Progress file standing in for browser local storage.
    #[serde(default = "default_store")]
    pub store: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            verbose: false,
        }
    }
}

fn default_store() -> PathBuf {
    PathBuf::from(".hoodquiz-progress.json")
}

/// Quiz data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Number of scored questions (the opener is not counted).
    #[serde(default = "default_question_count")]
    pub question_count: usize,

    /// Scoring table and category registry.
    #[serde(default = "default_scoring")]
    pub scoring: PathBuf,

    /// Question catalog.
    #[serde(default = "default_questions")]
    pub questions: PathBuf,

    /// Category reported when the scoring configuration is unusable.
    #[serde(default)]
    pub fallback_category: Option<String>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            scoring: default_scoring(),
            questions: default_questions(),
            fallback_category: None,
        }
    }
}

fn default_question_count() -> usize {
    14
}

fn default_scoring() -> PathBuf {
    PathBuf::from("data/scoring.json")
}

fn default_questions() -> PathBuf {
    PathBuf::from("data/questions.json")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the scoring diagnostics section.
    #[serde(default = "default_true")]
    pub include_diagnostics: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_diagnostics: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref store) = args.store {
            self.general.store = store.clone();
        }
        if let Some(ref scoring) = args.scoring {
            self.quiz.scoring = scoring.clone();
        }
        if let Some(ref questions) = args.questions {
            self.quiz.questions = questions.clone();
        }
        if let Some(count) = args.question_count {
            self.quiz.question_count = count;
        }
        if let Some(ref fallback) = args.fallback_category {
            self.quiz.fallback_category = Some(fallback.clone());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.quiz.question_count, 14);
        assert_eq!(config.quiz.scoring, PathBuf::from("data/scoring.json"));
        assert!(config.quiz.fallback_category.is_none());
        assert!(config.report.include_diagnostics);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
store = "/tmp/progress.json"
verbose = true

[quiz]
question_count = 2
scoring = "fixtures/scoring_small.json"
fallback_category = "chinatown"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.store, PathBuf::from("/tmp/progress.json"));
        assert!(config.general.verbose);
        assert_eq!(config.quiz.question_count, 2);
        assert_eq!(config.quiz.questions, PathBuf::from("data/questions.json"));
        assert_eq!(config.quiz.fallback_category.as_deref(), Some("chinatown"));
        assert!(config.report.include_diagnostics);
    }

    #[test]
    fn test_merge_with_args() {
        use crate::cli::Args;
        use clap::Parser;

        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = Args::try_parse_from(["hoodquiz", "--question-count", "3", "status"]).unwrap();
        config.merge_with_args(&args);

        // a config-file verbose survives when -v is absent
        assert!(config.general.verbose);
        assert_eq!(config.quiz.question_count, 3);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[quiz]"));
        assert!(toml_str.contains("[report]"));
    }
}
