// Colored terminal output for analyses, submit outcomes and comment feeds.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here when --json isn't set.

use colored::Colorize;

use crate::moderation::{AnalysisReport, CommentView, Decision, ModerationError};
use crate::rules::Category;

/// Display a single text's analysis.
pub fn display_analysis(text: &str, report: &AnalysisReport) {
    println!("\n{}", format!("=== \"{}\" ===", super::truncate_chars(text, 60)).bold());

    let verdict = if report.toxic {
        "TOXIC".red().bold()
    } else {
        "clean".green().bold()
    };
    println!("  Verdict: {}", verdict);
    println!("  Combined score: {}", colorize_score(report.combined_score));
    println!(
        "  Dominant category: {}",
        report
            .dominant_category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    match &report.classifier {
        Some(verdict) => println!(
            "  Classifier: {} ({:.2})",
            verdict.label, verdict.probability
        ),
        None => println!("  Classifier: {}", "unavailable (rule-only score)".yellow()),
    }

    display_category_scores(&report.rule_category_scores);

    if !report.matched_terms.is_empty() {
        let terms: Vec<&str> = report.matched_terms.iter().map(String::as_str).collect();
        println!("  Matched: {}", terms.join(", ").dimmed());
    }
}

/// One line per text for batch runs, then a summary.
pub fn display_batch(texts: &[String], results: &[Result<AnalysisReport, ModerationError>]) {
    println!("\n{}", format!("=== Batch analysis ({} texts) ===", texts.len()).bold());
    println!();

    let mut toxic = 0;
    let mut degraded = 0;
    for (i, (text, result)) in texts.iter().zip(results).enumerate() {
        let preview = super::truncate_chars(text.trim(), 60);
        match result {
            Ok(report) => {
                if report.toxic {
                    toxic += 1;
                }
                if report.degraded {
                    degraded += 1;
                }
                let flag = if report.toxic { "!!".red().bold() } else { "ok".green() };
                println!(
                    "  {:>4}. {}  {}  {:<18} {}",
                    i + 1,
                    flag,
                    colorize_score(report.combined_score),
                    report
                        .dominant_category
                        .map(|c| c.to_string())
                        .unwrap_or_default(),
                    preview.dimmed()
                );
            }
            Err(e) => println!("  {:>4}. {}  {}", i + 1, "--".dimmed(), e.to_string().yellow()),
        }
    }

    println!();
    println!("  {} of {} flagged", toxic, texts.len());
    if degraded > 0 {
        println!(
            "  {} {} scored without the classifier",
            "~".yellow(),
            degraded
        );
    }
}

/// Display the outcome of a submit.
pub fn display_decision(decision: &Decision) {
    match decision {
        Decision::Clean(comment) => {
            println!("{} Comment {} posted.", "✓".green(), comment.id);
        }
        Decision::Confirmed(comment) => {
            println!(
                "{} Comment {} posted with redactions.",
                "✓".yellow(),
                comment.id
            );
            println!("  Others will see: {}", comment.masked_text.dimmed());
        }
        Decision::Warned(warning) => {
            println!(
                "{} This comment may be hurtful (score {}).",
                "!".red().bold(),
                colorize_score(warning.combined_score)
            );
            if let Some(category) = warning.dominant_category {
                println!("  Mostly: {}", category.to_string().bold());
            }
            display_category_scores(&warning.rule_category_scores);
            println!(
                "\n  {}",
                "Resubmit with --confirm to post it anyway.".dimmed()
            );
        }
    }
}

/// Display the comments on a post as `viewer` sees them.
pub fn display_comments(post_id: i64, comments: &[CommentView]) {
    if comments.is_empty() {
        println!("No comments on post {post_id}.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Post {} ({} comments) ===", post_id, comments.len()).bold()
    );
    println!();

    for view in comments {
        match view {
            CommentView::Author(own) => {
                let marker = if own.toxic {
                    format!("[yours, score {:.2}]", own.combined_score).yellow()
                } else {
                    "[yours]".cyan()
                };
                println!("  #{:<5} {} {}", own.id, marker, own.text);
            }
            CommentView::Public(public) => {
                println!(
                    "  #{:<5} {} {}",
                    public.id,
                    format!("user {}", public.author_id).dimmed(),
                    public.text
                );
            }
        }
    }
}

fn display_category_scores(scores: &std::collections::BTreeMap<Category, u32>) {
    let hits: Vec<String> = scores
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(category, count)| format!("{category}: {count}"))
        .collect();
    if !hits.is_empty() {
        println!("  Rule hits: {}", hits.join(", "));
    }
}

/// Colorize a 0-1 score by band.
fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{:.2}", score);
    match score {
        s if s >= 0.75 => text.red().bold(),
        s if s >= 0.5 => text.bright_red(),
        s if s >= 0.25 => text.yellow(),
        _ => text.green(),
    }
}
