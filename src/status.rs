// System status display: DB stats, model files, classifier readiness.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ClassifierBackend, Config};
use crate::db::CommentStore;
use crate::toxicity::download::{model_files_present, model_size_bytes};
use crate::toxicity::{ClassifierAdapter, ClassifierStatus};

/// Display system status to the terminal.
pub async fn show(
    db: Option<&Arc<dyn CommentStore>>,
    config: &Config,
    classifier: &ClassifierAdapter,
) -> Result<()> {
    match db {
        Some(db) if Path::new(&config.db_path).exists() => {
            let file_size = std::fs::metadata(&config.db_path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            println!("Database: {} ({})", config.db_path, file_size);

            let stats = db.comment_stats().await?;
            println!(
                "Comments: {} total on {} posts, {} flagged and confirmed",
                stats.total, stats.posts, stats.toxic
            );
            if stats.degraded > 0 {
                println!(
                    "  {} scored without the classifier",
                    stats.degraded.to_string().yellow()
                );
            }
        }
        _ => {
            println!("Database: not initialized");
            println!("  Run `civility init` to set up the database.");
        }
    }

    match config.classifier_backend {
        ClassifierBackend::Onnx => {
            if model_files_present(&config.model_dir) {
                let size = model_size_bytes(&config.model_dir)
                    .map(format_bytes)
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "Model: {} at {} ({})",
                    config.model_preset.as_str(),
                    config.model_dir.display(),
                    size
                );
            } else {
                println!("Model: {} not downloaded", config.model_preset.as_str());
                println!("  Run `civility download-model` to fetch it");
            }
        }
        ClassifierBackend::Perspective => println!("Classifier backend: Perspective API"),
        ClassifierBackend::None => println!("Classifier backend: none (rules only)"),
    }

    println!("Classifier: {}", describe(&classifier.status()));
    println!(
        "Fusion: ml {:.2} / rules {:.2}, threshold {:.2}",
        config.fusion.ml_weight, config.fusion.rule_weight, config.fusion.ml_threshold
    );

    Ok(())
}

fn describe(status: &ClassifierStatus) -> colored::ColoredString {
    match status {
        ClassifierStatus::Ready => "ready".green(),
        ClassifierStatus::Loading => "loading".yellow(),
        ClassifierStatus::NotLoaded => "not loaded".dimmed(),
        ClassifierStatus::Disabled => "disabled".dimmed(),
        ClassifierStatus::Failed(e) => format!("failed: {e}").red(),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(126 * 1024 * 1024), "126.0 MB");
    }
}
