mod common;

use chrono::Duration;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{base_time, seed_comments, FlakyStore, VENDOR};
use doener_ranking::{
    error::AppError,
    feed::{
        upvote_key, CommentFeed, FeedState, EMPTY_MESSAGE, LOAD_ERROR_MESSAGE,
        REMAINDER_ERROR_LABEL,
    },
    infrastructure::{
        CollectionPath, DocumentStore, MemoryDocumentStore, MemoryPreferences, PreferenceStore,
        SqliteDocumentStore,
    },
    models::ANONYMOUS_NAME,
};

const PAGE: u32 = 5;

fn feed_over(store: Arc<dyn DocumentStore>) -> (CommentFeed, Arc<MemoryPreferences>) {
    let preferences = Arc::new(MemoryPreferences::new());
    let feed = CommentFeed::new(store, preferences.clone(), VENDOR, PAGE);
    (feed, preferences)
}

async fn stored_upvotes(store: &dyn DocumentStore, id: &str) -> i64 {
    store
        .get_all(&CollectionPath::comments(VENDOR))
        .await
        .unwrap()
        .into_iter()
        .find(|doc| doc.id == id)
        .and_then(|doc| doc.data.get("upvotes").and_then(|v| v.as_i64()))
        .unwrap()
}

#[tokio::test]
async fn test_no_comments_shows_empty_message() {
    let (mut feed, _) = feed_over(Arc::new(MemoryDocumentStore::new()));
    feed.load_first_page().await.unwrap();

    assert_eq!(feed.state(), FeedState::NoComments);
    let view = feed.render(base_time());
    assert!(view.comments.is_empty());
    assert_eq!(view.load_more, None);
    assert_eq!(view.message.as_deref(), Some(EMPTY_MESSAGE));
}

#[tokio::test]
async fn test_exactly_one_page_has_no_affordance() {
    let store = Arc::new(MemoryDocumentStore::new());
    seed_comments(store.as_ref(), VENDOR, PAGE as usize).await;
    let (mut feed, _) = feed_over(store);

    feed.load_first_page().await.unwrap();

    assert_eq!(feed.state(), FeedState::AllLoaded);
    assert_eq!(feed.entries().len(), 5);
    assert!(!feed.has_cursor());
    assert_eq!(feed.render(base_time()).load_more, None);
}

#[tokio::test]
async fn test_one_more_than_a_page_offers_remainder() {
    let store = Arc::new(MemoryDocumentStore::new());
    let ids = seed_comments(store.as_ref(), VENDOR, 6).await;
    let (mut feed, _) = feed_over(store);

    feed.load_first_page().await.unwrap();

    assert_eq!(feed.state(), FeedState::FirstPageLoaded);
    assert_eq!(feed.total(), 6);
    let view = feed.render(base_time() + Duration::hours(1));
    assert_eq!(view.load_more.as_deref(), Some("Alle 6 Kommentare anzeigen"));
    // Newest first
    let shown: Vec<&str> = view.comments.iter().map(|c| c.id.as_str()).collect();
    let expected: Vec<&str> = ids[1..].iter().rev().map(String::as_str).collect();
    assert_eq!(shown, expected);
}

#[tokio::test]
async fn test_remainder_appends_without_touching_first_page() {
    let store = Arc::new(MemoryDocumentStore::new());
    let ids = seed_comments(store.as_ref(), VENDOR, 8).await;
    let (mut feed, _) = feed_over(store);

    feed.load_first_page().await.unwrap();
    let first_page = feed.entries().to_vec();

    feed.load_remainder().await.unwrap();

    assert_eq!(feed.state(), FeedState::AllLoaded);
    assert_eq!(feed.entries().len(), 8);
    assert_eq!(&feed.entries()[..5], first_page.as_slice());
    let rest: Vec<&str> = feed.entries()[5..].iter().map(|c| c.id.as_str()).collect();
    assert_eq!(rest, vec![ids[2].as_str(), ids[1].as_str(), ids[0].as_str()]);
    assert_eq!(feed.render(base_time()).load_more, None);
}

#[tokio::test]
async fn test_failed_remainder_keeps_cursor_for_retry() {
    let store = Arc::new(FlakyStore::new());
    seed_comments(store.as_ref(), VENDOR, 7).await;
    let (mut feed, _) = feed_over(store.clone());
    feed.load_first_page().await.unwrap();

    store.fail_query.store(true, Ordering::SeqCst);
    let err = feed.load_remainder().await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_)));
    assert!(feed.has_cursor());
    assert_eq!(feed.entries().len(), 5);
    assert_eq!(
        feed.render(base_time()).load_more.as_deref(),
        Some(REMAINDER_ERROR_LABEL)
    );

    store.fail_query.store(false, Ordering::SeqCst);
    feed.load_remainder().await.unwrap();
    assert_eq!(feed.entries().len(), 7);
    assert_eq!(feed.state(), FeedState::AllLoaded);
}

#[tokio::test]
async fn test_count_failure_shows_load_error() {
    let store = Arc::new(FlakyStore::new());
    seed_comments(store.as_ref(), VENDOR, 3).await;
    store.fail_count.store(true, Ordering::SeqCst);
    let (mut feed, _) = feed_over(store);

    assert!(feed.load_first_page().await.is_err());
    assert_eq!(feed.state(), FeedState::Error);
    let view = feed.render(base_time());
    assert!(view.comments.is_empty());
    assert_eq!(view.message.as_deref(), Some(LOAD_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_upvote_on_then_off_restores_count_and_flag() {
    let store = Arc::new(MemoryDocumentStore::new());
    let ids = seed_comments(store.as_ref(), VENDOR, 2).await;
    let (mut feed, preferences) = feed_over(store.clone());
    feed.load_first_page().await.unwrap();
    let target = &ids[0];

    feed.toggle_upvote(target, true).await.unwrap();
    assert!(feed.is_upvoted(target));
    assert_eq!(preferences.get(&upvote_key(target)).as_deref(), Some("true"));
    assert_eq!(stored_upvotes(store.as_ref(), target).await, 1);
    let view = feed.render(base_time());
    let shown = view.comments.iter().find(|c| &c.id == target).unwrap();
    assert_eq!((shown.upvotes, shown.upvoted), (1, true));

    feed.toggle_upvote(target, false).await.unwrap();
    assert!(!feed.is_upvoted(target));
    assert_eq!(preferences.get(&upvote_key(target)), None);
    assert_eq!(stored_upvotes(store.as_ref(), target).await, 0);
    let view = feed.render(base_time());
    let shown = view.comments.iter().find(|c| &c.id == target).unwrap();
    assert_eq!((shown.upvotes, shown.upvoted), (0, false));
}

#[tokio::test]
async fn test_repeated_toggle_is_a_no_op() {
    let store = Arc::new(MemoryDocumentStore::new());
    let ids = seed_comments(store.as_ref(), VENDOR, 1).await;
    let (mut feed, _) = feed_over(store.clone());
    feed.load_first_page().await.unwrap();

    feed.toggle_upvote(&ids[0], true).await.unwrap();
    feed.toggle_upvote(&ids[0], true).await.unwrap();
    assert_eq!(stored_upvotes(store.as_ref(), &ids[0]).await, 1);
    assert_eq!(feed.entries()[0].upvotes, 1);
}

#[tokio::test]
async fn test_failed_upvote_keeps_optimistic_state() {
    let store = Arc::new(FlakyStore::new());
    let ids = seed_comments(store.as_ref(), VENDOR, 1).await;
    let (mut feed, preferences) = feed_over(store.clone());
    feed.load_first_page().await.unwrap();

    store.fail_increment.store(true, Ordering::SeqCst);
    assert!(feed.toggle_upvote(&ids[0], true).await.is_err());

    // No reconciliation: local state drifts from the store
    assert!(feed.is_upvoted(&ids[0]));
    assert_eq!(preferences.get(&upvote_key(&ids[0])).as_deref(), Some("true"));
    assert_eq!(feed.entries()[0].upvotes, 1);
    assert_eq!(stored_upvotes(store.as_ref(), &ids[0]).await, 0);
}

#[tokio::test]
async fn test_upvote_on_unrendered_comment_is_not_found() {
    let (mut feed, _) = feed_over(Arc::new(MemoryDocumentStore::new()));
    let err = feed.toggle_upvote("missing", true).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!feed.is_upvoted("missing"));
}

#[tokio::test]
async fn test_submitted_comment_appears_on_next_load() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (mut feed, _) = feed_over(store);
    feed.load_first_page().await.unwrap();
    assert_eq!(feed.state(), FeedState::NoComments);

    let id = feed.submit(Some("   "), "Sehr lecker").await.unwrap();
    // Not re-rendered until the next load
    assert!(feed.entries().is_empty());

    feed.load_first_page().await.unwrap();
    assert_eq!(feed.entries().len(), 1);
    let entry = &feed.entries()[0];
    assert_eq!(entry.id, id);
    assert_eq!(entry.name, ANONYMOUS_NAME);
    assert_eq!(entry.comment, "Sehr lecker");
    assert_eq!(entry.upvotes, 0);
}

#[tokio::test]
async fn test_feed_pages_over_sqlite() {
    let store = Arc::new(SqliteDocumentStore::new_in_memory().await.unwrap());
    seed_comments(store.as_ref(), VENDOR, 6).await;
    seed_comments(store.as_ref(), "Anderer Imbiss", 2).await;
    let (mut feed, _) = feed_over(store);

    feed.load_first_page().await.unwrap();
    assert_eq!(feed.total(), 6);
    assert_eq!(feed.entries().len(), 5);

    feed.load_remainder().await.unwrap();
    assert_eq!(feed.entries().len(), 6);
    assert_eq!(feed.entries()[5].comment, "Kommentar 0");
}
