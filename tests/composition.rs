// Composition tests: the whole engine, end to end.
//
// Each test wires a real RuleCategorizer, Masker and in-memory SQLite store
// to a fake classifier, then drives the public API the way a host
// application would:
//   submit -> analyze -> fuse -> decide -> (mask) -> store -> resolve

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

use civility::db::{self, Comment, CommentStats, CommentStore, NewComment};
use civility::moderation::{
    Analyzer, CommentView, Decision, Masker, ModerationEngine, ModerationError, SubmitRequest,
};
use civility::rules::{Category, Lexicon, RuleCategorizer, DEFAULT_SENSITIVITY};
use civility::scoring::FusionWeights;
use civility::toxicity::{ClassifierAdapter, ClassifierLoader, ModelVerdict, ToxicityClassifier};

// ============================================================
// Fakes
// ============================================================

struct FixedClassifier {
    label: &'static str,
    probability: f64,
}

#[async_trait]
impl ToxicityClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<ModelVerdict> {
        Ok(ModelVerdict::new(self.label, self.probability))
    }
}

struct BrokenClassifier;

#[async_trait]
impl ToxicityClassifier for BrokenClassifier {
    async fn classify(&self, _text: &str) -> Result<ModelVerdict> {
        anyhow::bail!("onnx runtime exploded")
    }
}

/// Counts loads and optionally sleeps before handing out the classifier.
struct FakeLoader {
    classifier: Arc<dyn ToxicityClassifier>,
    delay: Duration,
    loads: Arc<AtomicUsize>,
}

#[async_trait]
impl ClassifierLoader for FakeLoader {
    async fn load(&self) -> Result<Arc<dyn ToxicityClassifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Arc::clone(&self.classifier))
    }
}

/// Store whose writes always fail. Reads see an empty database.
#[derive(Default)]
struct FailingStore {
    inserts: AtomicUsize,
}

#[async_trait]
impl CommentStore for FailingStore {
    async fn table_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn insert_comment(&self, _comment: &NewComment) -> Result<Comment> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("disk I/O error")
    }

    async fn get_comment(&self, _id: i64) -> Result<Option<Comment>> {
        Ok(None)
    }

    async fn comments_for_post(&self, _post_id: i64) -> Result<Vec<Comment>> {
        Ok(Vec::new())
    }

    async fn delete_comment(&self, _id: i64) -> Result<bool> {
        Ok(false)
    }

    async fn comment_stats(&self) -> Result<CommentStats> {
        Ok(CommentStats::default())
    }
}

fn adapter_for(classifier: Arc<dyn ToxicityClassifier>) -> ClassifierAdapter {
    let loader = FakeLoader {
        classifier,
        delay: Duration::ZERO,
        loads: Arc::new(AtomicUsize::new(0)),
    };
    ClassifierAdapter::new(Arc::new(loader), Duration::from_secs(5))
}

fn fixed(label: &'static str, probability: f64) -> ClassifierAdapter {
    adapter_for(Arc::new(FixedClassifier { label, probability }))
}

fn engine_with(adapter: ClassifierAdapter, custom_words: &[&str]) -> ModerationEngine {
    engine_on(adapter, custom_words, db::in_memory().unwrap())
}

fn engine_on(
    adapter: ClassifierAdapter,
    custom_words: &[&str],
    store: Arc<dyn CommentStore>,
) -> ModerationEngine {
    let lexicon = Lexicon {
        custom_words: custom_words.iter().map(|w| w.to_string()).collect(),
        ..Lexicon::default()
    };
    let categorizer = RuleCategorizer::new(&lexicon, DEFAULT_SENSITIVITY).unwrap();
    let masker = Masker::new(&lexicon, '*').unwrap();
    let analyzer = Analyzer::new(categorizer, Arc::new(adapter), FusionWeights::default());
    ModerationEngine::new(analyzer, masker, store)
}

fn request(author_id: i64, text: &str, confirm: bool) -> SubmitRequest {
    SubmitRequest {
        author_id,
        post_id: 1,
        text: text.to_string(),
        confirm,
    }
}

// ============================================================
// Submit workflow
// ============================================================

#[tokio::test]
async fn custom_word_comment_warns_then_stores_masked_once() {
    let engine = engine_with(fixed("toxicity", 0.1), &["stupid"]);

    let first = engine.submit(request(10, "You are stupid", false)).await.unwrap();
    let warning = match first {
        Decision::Warned(warning) => warning,
        other => panic!("expected a warning, got {other:?}"),
    };
    assert_eq!(warning.dominant_category, Some(Category::Insults));
    assert_eq!(warning.rule_category_scores[&Category::Insults], 1);
    assert!(engine.store().comments_for_post(1).await.unwrap().is_empty());

    let second = engine.submit(request(10, "You are stupid", true)).await.unwrap();
    let comment = match second {
        Decision::Confirmed(comment) => comment,
        other => panic!("expected a confirmed comment, got {other:?}"),
    };
    assert!(comment.toxic);
    assert_eq!(comment.masked_text, "You are ******");
    assert_eq!(comment.original_text, "You are stupid");
    assert_eq!(comment.dominant_category, Some(Category::Insults));

    let stored = engine.store().comments_for_post(1).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], comment);
}

#[tokio::test]
async fn clean_comment_is_stored_unmasked() {
    let engine = engine_with(fixed("toxicity", 0.02), &["stupid"]);

    let decision = engine.submit(request(10, "Beautiful photo!", false)).await.unwrap();
    let comment = match decision {
        Decision::Clean(comment) => comment,
        other => panic!("expected a clean comment, got {other:?}"),
    };
    assert!(!comment.toxic);
    assert_eq!(comment.masked_text, comment.original_text);
    assert_eq!(comment.dominant_category, None);
    assert_eq!(comment.classifier_label.as_deref(), Some("toxicity"));
    assert!(!comment.degraded);
}

#[tokio::test]
async fn confirm_on_clean_text_is_just_clean() {
    let engine = engine_with(fixed("toxicity", 0.02), &[]);
    let decision = engine.submit(request(10, "Nice one", true)).await.unwrap();
    assert!(matches!(decision, Decision::Clean(_)));
}

#[tokio::test]
async fn classifier_alone_can_flag_without_category() {
    let engine = engine_with(fixed("toxicity", 0.93), &["stupid"]);

    let decision = engine.submit(request(10, "What a lovely day", false)).await.unwrap();
    let warning = match decision {
        Decision::Warned(warning) => warning,
        other => panic!("expected a warning, got {other:?}"),
    };
    assert_eq!(warning.dominant_category, None);
    assert!(warning.rule_category_scores.values().all(|&c| c == 0));

    // Confirmed, but nothing to redact: only custom words are masked.
    let decision = engine.submit(request(10, "What a lovely day", true)).await.unwrap();
    let comment = decision.comment().unwrap();
    assert!(comment.toxic);
    assert_eq!(comment.masked_text, "What a lovely day");
}

#[tokio::test]
async fn non_custom_insult_is_flagged_but_not_masked() {
    let engine = engine_with(fixed("toxicity", 0.1), &["stupid"]);
    let decision = engine.submit(request(10, "what an idiot", true)).await.unwrap();
    let comment = decision.comment().unwrap();
    assert!(comment.toxic);
    assert_eq!(comment.masked_text, "what an idiot");
}

#[tokio::test]
async fn text_is_trimmed_before_storage() {
    let engine = engine_with(fixed("toxicity", 0.0), &[]);
    let decision = engine.submit(request(10, "  hello there \n", false)).await.unwrap();
    assert_eq!(decision.comment().unwrap().original_text, "hello there");
}

#[tokio::test]
async fn blank_text_is_rejected_and_nothing_stored() {
    let engine = engine_with(fixed("toxicity", 0.0), &[]);
    for text in ["", "   ", "\t\n"] {
        let result = engine.submit(request(10, text, true)).await;
        assert!(matches!(result, Err(ModerationError::InvalidInput(_))));
    }
    assert_eq!(engine.store().comment_stats().await.unwrap().total, 0);
}

// ============================================================
// Degraded scoring
// ============================================================

#[tokio::test]
async fn disabled_classifier_scores_with_rules_only() {
    let engine = engine_with(ClassifierAdapter::disabled(), &["stupid"]);

    let report = engine.analyze("You are stupid").await.unwrap();
    assert!(report.degraded);
    assert!(report.toxic);
    assert!(report.classifier.is_none());
    // one hit in three tokens saturates the rule score
    assert!((report.combined_score - 1.0).abs() < 1e-10);

    let decision = engine.submit(request(10, "You are stupid", true)).await.unwrap();
    let comment = decision.comment().unwrap();
    assert!(comment.degraded);
    assert_eq!(comment.classifier_label, None);
    assert_eq!(comment.masked_text, "You are ******");
}

#[tokio::test]
async fn failing_inference_degrades_instead_of_erroring() {
    let engine = engine_with(adapter_for(Arc::new(BrokenClassifier)), &[]);
    let decision = engine.submit(request(10, "Beautiful photo!", false)).await.unwrap();
    let comment = decision.comment().unwrap();
    assert!(comment.degraded);
    assert!(!comment.toxic);
    assert_eq!(comment.combined_score, 0.0);
}

#[tokio::test]
async fn slow_model_load_times_out_to_rule_only() {
    let loads = Arc::new(AtomicUsize::new(0));
    let loader = FakeLoader {
        classifier: Arc::new(FixedClassifier {
            label: "toxicity",
            probability: 0.99,
        }),
        delay: Duration::from_millis(300),
        loads: Arc::clone(&loads),
    };
    let adapter = ClassifierAdapter::new(Arc::new(loader), Duration::from_millis(30));
    let engine = engine_with(adapter, &[]);

    let started = Instant::now();
    let report = engine.analyze("Beautiful photo!").await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(250));
    assert!(report.degraded);
    assert!(!report.toxic);

    // The load kept going in the background; once it's done the model is used.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let report = engine.analyze("Beautiful photo!").await.unwrap();
    assert!(!report.degraded);
    assert!(report.toxic);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_requests_share_one_model_load() {
    let loads = Arc::new(AtomicUsize::new(0));
    let loader = FakeLoader {
        classifier: Arc::new(FixedClassifier {
            label: "toxicity",
            probability: 0.2,
        }),
        delay: Duration::from_millis(50),
        loads: Arc::clone(&loads),
    };
    let adapter = ClassifierAdapter::new(Arc::new(loader), Duration::from_secs(5));
    let engine = Arc::new(engine_with(adapter, &[]));

    let tasks = (0..12).map(|i| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .submit(request(i, &format!("comment number {i}"), false))
                .await
        })
    });
    for result in futures::future::join_all(tasks).await {
        assert!(matches!(result.unwrap().unwrap(), Decision::Clean(_)));
    }

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(engine.store().comment_stats().await.unwrap().total, 12);
}

// ============================================================
// Reads and deletes
// ============================================================

#[tokio::test]
async fn feed_is_viewer_scoped_and_oldest_first() {
    let engine = engine_with(fixed("toxicity", 0.1), &["stupid"]);
    let clean = engine.submit(request(10, "Great shot", false)).await.unwrap();
    let masked = engine.submit(request(20, "stupid angle", true)).await.unwrap();

    let as_author = engine.comments_for_post(1, Some(20)).await.unwrap();
    assert_eq!(as_author.len(), 2);
    assert_eq!(as_author[0].id(), clean.comment().unwrap().id);
    assert!(matches!(as_author[0], CommentView::Public(_)));
    assert!(matches!(as_author[1], CommentView::Author(_)));
    assert_eq!(as_author[1].text(), "stupid angle");

    for viewer in [None, Some(10), Some(999)] {
        let views = engine.comments_for_post(1, viewer).await.unwrap();
        assert_eq!(views[1].id(), masked.comment().unwrap().id);
        assert_eq!(views[1].text(), "****** angle");
    }
}

#[tokio::test]
async fn only_the_author_can_delete() {
    let engine = engine_with(fixed("toxicity", 0.1), &[]);
    let decision = engine.submit(request(10, "first!", false)).await.unwrap();
    let id = decision.comment().unwrap().id;

    assert!(matches!(
        engine.delete_comment(id, 11).await,
        Err(ModerationError::Forbidden(_))
    ));
    engine.delete_comment(id, 10).await.unwrap();
    assert!(matches!(
        engine.delete_comment(id, 10).await,
        Err(ModerationError::NotFound(_))
    ));
    assert!(engine.comments_for_post(1, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn reading_and_deleting_never_load_the_classifier() {
    let loads = Arc::new(AtomicUsize::new(0));
    let loader = FakeLoader {
        classifier: Arc::new(FixedClassifier {
            label: "toxicity",
            probability: 0.1,
        }),
        delay: Duration::ZERO,
        loads: Arc::clone(&loads),
    };
    let adapter = ClassifierAdapter::new(Arc::new(loader), Duration::from_secs(5));
    let engine = engine_with(adapter, &[]);

    assert!(engine.comments_for_post(1, Some(10)).await.unwrap().is_empty());
    assert!(matches!(
        engine.delete_comment(99, 10).await,
        Err(ModerationError::NotFound(99))
    ));
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

// ============================================================
// Storage failures
// ============================================================

#[tokio::test]
async fn failed_insert_propagates_without_retry() {
    let store = Arc::new(FailingStore::default());
    let engine = engine_on(fixed("toxicity", 0.1), &["stupid"], store.clone());

    let result = engine.submit(request(10, "You are stupid", true)).await;
    match result {
        Err(ModerationError::Storage(e)) => assert!(e.to_string().contains("disk I/O error")),
        other => panic!("expected a storage error, got {other:?}"),
    }
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);

    let result = engine.submit(request(10, "Beautiful photo!", false)).await;
    assert!(matches!(result, Err(ModerationError::Storage(_))));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn warning_never_touches_the_store() {
    let store = Arc::new(FailingStore::default());
    let engine = engine_on(fixed("toxicity", 0.1), &["stupid"], store.clone());

    let decision = engine.submit(request(10, "You are stupid", false)).await.unwrap();
    assert!(matches!(decision, Decision::Warned(_)));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

// ============================================================
// Wire shapes and invariants
// ============================================================

#[tokio::test]
async fn submit_responses_serialize_with_status_tag() {
    let engine = engine_with(fixed("toxicity", 0.1), &["stupid"]);

    let warned = engine.submit(request(10, "You are stupid", false)).await.unwrap();
    let json = serde_json::to_value(warned.response()).unwrap();
    assert_eq!(json["status"], "warning");
    assert_eq!(json["dominant_category"], "insults");
    assert_eq!(json["rule_category_scores"]["insults"], 1);
    assert!(json["combined_score"].is_f64());

    let posted = engine.submit(request(10, "You are stupid", true)).await.unwrap();
    let json = serde_json::to_value(posted.response()).unwrap();
    assert_eq!(json["status"], "posted");
    assert_eq!(json["comment_id"], posted.comment().unwrap().id);
}

#[tokio::test]
async fn public_payload_has_no_moderation_metadata() {
    let engine = engine_with(fixed("toxicity", 0.1), &["stupid"]);
    engine.submit(request(10, "stupid", true)).await.unwrap();

    let public = engine.comments_for_post(1, Some(11)).await.unwrap();
    let json = serde_json::to_value(&public[0]).unwrap();
    for field in [
        "toxic",
        "combined_score",
        "dominant_category",
        "rule_category_scores",
        "original_text",
        "masked_text",
    ] {
        assert!(json.get(field).is_none(), "public payload leaked {field}");
    }
    assert_eq!(json["text"], "******");

    let own = engine.comments_for_post(1, Some(10)).await.unwrap();
    let json = serde_json::to_value(&own[0]).unwrap();
    assert_eq!(json["text"], "stupid");
    assert_eq!(json["toxic"], true);
}

#[tokio::test]
async fn combined_score_stays_in_unit_range() {
    let texts = [
        "idiot idiot idiot idiot",
        "Beautiful photo!",
        "yeah right 🙄🙄🙄",
        "people like you, go away, nobody likes you",
        "ನೀನು ಮೂರ್ಖ moorka",
    ];
    for probability in [0.0, 0.5, 1.0, 1.4, -0.2] {
        let engine = engine_with(fixed("toxicity", probability), &["moorka"]);
        for text in texts {
            let report = engine.analyze(text).await.unwrap();
            assert!(
                (0.0..=1.0).contains(&report.combined_score),
                "{text:?} with p={probability} scored {}",
                report.combined_score
            );
        }
    }
}
