// Unit tests for viewer-scoped comment rendering.

use std::collections::BTreeMap;

use civility::db::Comment;
use civility::moderation::{resolve, CommentView};
use civility::rules::Category;

fn flagged_comment() -> Comment {
    Comment {
        id: 3,
        post_id: 9,
        author_id: 42,
        original_text: "You are stupid".to_string(),
        masked_text: "You are ******".to_string(),
        toxic: true,
        combined_score: 0.46,
        dominant_category: Some(Category::Insults),
        rule_category_scores: BTreeMap::from([(Category::Insults, 1)]),
        classifier_label: Some("toxicity".to_string()),
        classifier_probability: Some(0.1),
        degraded: false,
        created_at: "2026-03-01T12:00:00.000000Z".to_string(),
    }
}

#[test]
fn author_sees_original_and_metadata() {
    let comment = flagged_comment();
    match resolve(&comment, Some(42)) {
        CommentView::Author(view) => {
            assert_eq!(view.text, "You are stupid");
            assert!(view.toxic);
            assert_eq!(view.dominant_category, Some(Category::Insults));
            assert_eq!(view.rule_category_scores[&Category::Insults], 1);
        }
        other => panic!("author got {other:?}"),
    }
}

#[test]
fn everyone_else_sees_masked_text_only() {
    let comment = flagged_comment();
    for viewer in [None, Some(0), Some(41), Some(-42)] {
        let view = resolve(&comment, viewer);
        assert!(matches!(view, CommentView::Public(_)), "viewer {viewer:?}");
        assert_eq!(view.text(), "You are ******");
        assert_eq!(view.id(), 3);
    }
}

#[test]
fn public_json_has_exactly_the_public_fields() {
    let json = serde_json::to_value(resolve(&flagged_comment(), None)).unwrap();
    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["author_id", "created_at", "id", "post_id", "text"]);
}

#[test]
fn resolve_is_stateless() {
    let comment = flagged_comment();
    let first = resolve(&comment, Some(7));
    let _ = resolve(&comment, Some(42));
    assert_eq!(resolve(&comment, Some(7)), first);
}
