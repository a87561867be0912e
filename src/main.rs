use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use civility::config::{ClassifierBackend, Config};
use civility::db::CommentStore;
use civility::moderation::{Analyzer, Masker, ModerationEngine, SubmitRequest};
use civility::output::{print_json, terminal};
use civility::rules::{Lexicon, RuleCategorizer};
use civility::toxicity::onnx::OnnxLoader;
use civility::toxicity::perspective::PerspectiveLoader;
use civility::toxicity::ClassifierAdapter;

/// Civility: comment moderation for social feeds.
///
/// Scores comments with a toxicity model plus word-list rules, warns authors
/// before flagged comments go out, and shows everyone else a redacted copy.
#[derive(Parser)]
#[command(name = "civility", version, about)]
struct Cli {
    /// Print machine-readable JSON instead of colored text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Download the ONNX toxicity model (~126 MB)
    DownloadModel,

    /// Analyze a single text without storing anything
    Analyze {
        /// The text to analyze
        text: String,
    },

    /// Analyze every non-empty line of a file
    AnalyzeFile {
        /// Path to a UTF-8 text file, one comment per line
        path: PathBuf,

        /// Number of lines to analyze in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Submit a comment on a post
    Submit {
        /// Author's user id
        #[arg(long)]
        author: i64,

        /// Post id the comment belongs to
        #[arg(long)]
        post: i64,

        /// Post even if the comment is flagged (it will be redacted for others)
        #[arg(long)]
        confirm: bool,

        /// The comment text
        text: String,
    },

    /// List the comments on a post as a given viewer sees them
    Comments {
        #[arg(long)]
        post: i64,

        /// Viewer's user id (omit for an anonymous viewer)
        #[arg(long)]
        viewer: Option<i64>,
    },

    /// Delete a comment (author only)
    Delete {
        #[arg(long)]
        comment: i64,

        /// User id of whoever is asking
        #[arg(long)]
        requester: i64,
    },

    /// Show system status (DB stats, model files, classifier readiness)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("civility=info")),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            info!("Initializing Civility database...");
            let config = Config::load()?;
            let db = civility::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            if config.classifier_backend == ClassifierBackend::Onnx
                && !civility::toxicity::download::model_files_present(&config.model_dir)
            {
                println!("\nNext step: civility download-model");
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            println!(
                "Downloading {} model files to {}",
                config.model_preset.as_str(),
                config.model_dir.display()
            );
            civility::toxicity::download::download_model(
                &config.model_dir,
                &config.model_url,
                &config.model_file,
            )
            .await?;
            println!("\n{}", "Model ready.".green().bold());
        }

        Commands::Analyze { text } => {
            let config = Config::load()?;
            let lexicon = config.lexicon()?;
            let analyzer = build_analyzer(&config, &lexicon, create_classifier(&config))?;
            let analysis = analyzer.analyze(&text).await?;
            let report = civility::moderation::AnalysisReport::from(&analysis);
            if json {
                print_json(&report)?;
            } else {
                terminal::display_analysis(&text, &report);
            }
        }

        Commands::AnalyzeFile { path, concurrency } => {
            let config = Config::load()?;
            let lexicon = config.lexicon()?;
            let analyzer = build_analyzer(&config, &lexicon, create_classifier(&config))?;
            let texts = read_lines(&path)?;
            info!(count = texts.len(), concurrency, "Analyzing file");
            let results = analyzer.analyze_batch(&texts, concurrency).await;
            if json {
                let rows: Vec<serde_json::Value> = texts
                    .iter()
                    .zip(&results)
                    .map(|(text, result)| match result {
                        Ok(report) => serde_json::json!({ "text": text, "analysis": report }),
                        Err(e) => serde_json::json!({ "text": text, "error": e.to_string() }),
                    })
                    .collect();
                print_json(&rows)?;
            } else {
                terminal::display_batch(&texts, &results);
            }
        }

        Commands::Submit {
            author,
            post,
            confirm,
            text,
        } => {
            let config = Config::load()?;
            let store = civility::db::open_sqlite(&config.db_path)?;
            let engine = build_engine(&config, store, create_classifier(&config))?;
            let decision = engine
                .submit(SubmitRequest {
                    author_id: author,
                    post_id: post,
                    text,
                    confirm,
                })
                .await?;
            if json {
                print_json(&decision.response())?;
            } else {
                terminal::display_decision(&decision);
            }
        }

        Commands::Comments { post, viewer } => {
            let config = Config::load()?;
            let engine = read_only_engine(&config)?;
            let views = engine.comments_for_post(post, viewer).await?;
            if json {
                print_json(&views)?;
            } else {
                terminal::display_comments(post, &views);
            }
        }

        Commands::Delete { comment, requester } => {
            let config = Config::load()?;
            let engine = read_only_engine(&config)?;
            engine.delete_comment(comment, requester).await?;
            if json {
                print_json(&serde_json::json!({ "deleted": comment }))?;
            } else {
                println!("{} Comment {} deleted.", "✓".green(), comment);
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = if Path::new(&config.db_path).exists() {
                Some(civility::db::open_sqlite(&config.db_path)?)
            } else {
                None
            };
            let classifier = create_classifier(&config);
            // Start the load and classify one sample so the status reflects a real
            // load attempt rather than "not loaded".
            classifier.warm_up();
            let _ = classifier.classify("status check").await;
            civility::status::show(db.as_ref(), &config, &classifier).await?;
        }
    }

    Ok(())
}

/// Create the classifier adapter for the configured backend.
///
/// A backend that isn't ready (model not downloaded, API key missing) is
/// logged and left in place: its load fails once and scoring runs on rules.
fn create_classifier(config: &Config) -> Arc<ClassifierAdapter> {
    if let Err(e) = config.require_classifier() {
        warn!("{e:#}");
    }

    let adapter = match config.classifier_backend {
        ClassifierBackend::Onnx => {
            info!("Using local ONNX toxicity classifier");
            let loader = OnnxLoader::new(config.model_dir.clone(), config.model_labels.clone());
            ClassifierAdapter::new(Arc::new(loader), config.classifier_timeout)
        }
        ClassifierBackend::Perspective => {
            info!("Using Perspective API toxicity classifier");
            let loader = PerspectiveLoader::new(config.perspective_api_key.clone());
            ClassifierAdapter::new(Arc::new(loader), config.classifier_timeout)
        }
        ClassifierBackend::None => {
            info!("No classifier configured, scoring with rules only");
            ClassifierAdapter::disabled()
        }
    };
    Arc::new(adapter)
}

fn build_analyzer(
    config: &Config,
    lexicon: &Lexicon,
    classifier: Arc<ClassifierAdapter>,
) -> Result<Analyzer> {
    let categorizer = RuleCategorizer::new(lexicon, config.rule_sensitivity)?;
    Ok(Analyzer::new(categorizer, classifier, config.fusion.clone()))
}

fn build_engine(
    config: &Config,
    store: Arc<dyn CommentStore>,
    classifier: Arc<ClassifierAdapter>,
) -> Result<ModerationEngine> {
    let lexicon = config.lexicon()?;
    let masker = Masker::new(&lexicon, config.mask_char)?;
    let analyzer = build_analyzer(config, &lexicon, classifier)?;
    Ok(ModerationEngine::new(analyzer, masker, store))
}

/// Engine for commands that never score text (reading the feed, deleting).
/// Skips the classifier entirely, so no model load and no readiness warnings.
fn read_only_engine(config: &Config) -> Result<ModerationEngine> {
    let store = civility::db::open_sqlite(&config.db_path)?;
    build_engine(config, store, Arc::new(ClassifierAdapter::disabled()))
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}
