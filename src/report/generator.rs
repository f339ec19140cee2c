//! Result card generation.
//!
//! Renders a resolved quiz run as Markdown or JSON.

use crate::models::{ReportMetadata, ResultReport, ScoreLine, ScoringDiagnostics};
use anyhow::Result;

/// Generate a complete Markdown result card.
pub fn generate_markdown_report(report: &ResultReport, include_diagnostics: bool) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# You are {}\n\n", report.category.name));

    if !report.category.image.is_empty() {
        output.push_str(&format!(
            "![{}]({})\n\n",
            report.category.name, report.category.image
        ));
    }

    output.push_str(&generate_tie_note(&report.tied_with));
    output.push_str(&generate_scores_section(&report.scores));

    if include_diagnostics {
        output.push_str(&generate_diagnostics_section(&report.diagnostics));
    }

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_footer());

    output
}

fn generate_tie_note(tied_with: &[String]) -> String {
    if tied_with.is_empty() {
        return String::new();
    }

    format!(
        "> Too close to call! You also matched: {}. The winner was drawn at random.\n\n",
        tied_with.join(", ")
    )
}

/// Generate the score table.
fn generate_scores_section(scores: &[ScoreLine]) -> String {
    let mut section = String::new();

    section.push_str("## Scores\n\n");
    section.push_str("| Neighborhood | Points |\n");
    section.push_str("|:---|:---:|\n");

    for line in scores {
        section.push_str(&format!("| {} | {} |\n", line.name, line.score));
    }
    section.push('\n');

    section
}

/// Generate the diagnostics section; empty when nothing was absorbed.
fn generate_diagnostics_section(diagnostics: &ScoringDiagnostics) -> String {
    if *diagnostics == ScoringDiagnostics::default() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Scoring Diagnostics\n\n");
    if diagnostics.unanswered > 0 {
        section.push_str(&format!(
            "- **Unanswered questions:** {}\n",
            diagnostics.unanswered
        ));
    }
    if diagnostics.missing_entries > 0 {
        section.push_str(&format!(
            "- **Answers without a scoring entry:** {}\n",
            diagnostics.missing_entries
        ));
    }
    if diagnostics.unknown_categories > 0 {
        section.push_str(&format!(
            "- **Points for unknown categories:** {}\n",
            diagnostics.unknown_categories
        ));
    }
    section.push('\n');

    section
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Details\n\n");
    section.push_str(&format!(
        "- **Resolved:** {}\n",
        metadata.resolved_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Answered:** {} of {}\n",
        metadata.answered, metadata.question_count
    ));
    if let Some(seed) = metadata.seed {
        section.push_str(&format!("- **Tie-break seed:** {}\n", seed));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*made by 2 friends..*\n".to_string()
}

/// Generate a JSON result card.
pub fn generate_json_report(report: &ResultReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Utc;

    fn create_test_report() -> ResultReport {
        ResultReport {
            metadata: ReportMetadata {
                resolved_at: Utc::now(),
                question_count: 14,
                answered: 13,
                seed: Some(42),
            },
            category: Category {
                key: "chinatown".to_string(),
                name: "Chinatown".to_string(),
                image: "/result/chinatown.PNG".to_string(),
            },
            scores: vec![
                ScoreLine {
                    key: "chinatown".to_string(),
                    name: "Chinatown".to_string(),
                    score: 12,
                },
                ScoreLine {
                    key: "mission".to_string(),
                    name: "The Mission".to_string(),
                    score: 12,
                },
            ],
            tied_with: vec!["mission".to_string()],
            diagnostics: ScoringDiagnostics {
                unanswered: 1,
                missing_entries: 0,
                unknown_categories: 0,
            },
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, true);

        assert!(markdown.contains("# You are Chinatown"));
        assert!(markdown.contains("/result/chinatown.PNG"));
        assert!(markdown.contains("| The Mission | 12 |"));
        assert!(markdown.contains("You also matched: mission"));
        assert!(markdown.contains("Unanswered questions:** 1"));
        assert!(!markdown.contains("unknown categories"));
        assert!(markdown.contains("Tie-break seed:** 42"));
    }

    #[test]
    fn test_markdown_without_diagnostics() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, false);
        assert!(!markdown.contains("Scoring Diagnostics"));
    }

    #[test]
    fn test_no_tie_note_for_clear_winner() {
        assert!(generate_tie_note(&[]).is_empty());
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"category\""));
        assert!(json.contains("\"tied_with\""));
        assert!(json.contains("\"seed\": 42"));
    }
}
