//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// HoodQuiz - which SF neighborhood are you?
///
/// Score quiz answers against a scoring table, walk through the quiz one
/// answer at a time, and render the result card.
///
/// Examples:
///   hoodquiz resolve --answers 0,1,2,0,1,2,0,1,2,0,1,2,0,1
///   hoodquiz resolve --answers 0,-1,1 --question-count 3 --seed 7 --format json
///   hoodquiz status
///   hoodquiz answer 2
///   hoodquiz validate
///   hoodquiz init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .hoodquiz.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Scoring table (JSON)
    #[arg(long, value_name = "FILE", global = true, env = "HOODQUIZ_SCORING")]
    pub scoring: Option<PathBuf>,

    /// Question catalog (JSON)
    #[arg(long, value_name = "FILE", global = true, env = "HOODQUIZ_QUESTIONS")]
    pub questions: Option<PathBuf>,

    /// Progress file used by the step-by-step commands
    #[arg(long, value_name = "FILE", global = true, env = "HOODQUIZ_STORE")]
    pub store: Option<PathBuf>,

    /// Number of scored questions
    #[arg(long, value_name = "NUM", global = true)]
    pub question_count: Option<usize>,

    /// Category to report if the scoring table cannot be used
    #[arg(long, value_name = "KEY", global = true)]
    pub fallback_category: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a full answer vector in one go
    Resolve {
        /// Comma-separated option indices, -1 for unanswered
        #[arg(
            short,
            long,
            value_name = "LIST",
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        answers: Vec<i64>,

        /// Seed for the tie-break generator
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the result card to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show the current question
    Status,

    /// Pick an option on the current question
    Answer {
        /// Zero-based option index
        option: usize,

        /// Seed for the tie-break generator
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },

    /// Go back one question
    Back,

    /// Clear all progress and the saved result
    Retry,

    /// Start over from the opener, keeping the saved result
    Again,

    /// Show the saved result of the last completed run
    Result {
        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Load and cross-check the quiz data without playing
    Validate,

    /// Generate a default .hoodquiz.toml configuration file
    InitConfig,
}

/// Output format for the result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.question_count == Some(0) {
            return Err("Question count must be at least 1".to_string());
        }

        if let Some(ref fallback) = self.fallback_category {
            if fallback.trim().is_empty() {
                return Err("Fallback category must not be empty".to_string());
            }
        }

        if let Command::Resolve { ref answers, .. } = self.command {
            if answers.is_empty() {
                return Err("At least one answer is required".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` comes from `[general] verbose`; `--quiet` beats it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
