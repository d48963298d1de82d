use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use doener_ranking::{
    app_state::ensure_database_dir,
    config::Config,
    error::AppResult,
    identity::AnonymousUser,
    infrastructure::{CollectionPath, DocumentStore, SqliteDocumentStore},
    models::{comment::UPVOTES_FIELD, NewComment},
    rating::RatingPanel,
    ranking::{FileSnapshot, RankingTable},
};

const SAMPLE_COMMENTS: [(Option<&str>, &str); 6] = [
    (Some("Mehmet"), "Bestes Brot der Stadt, die Soße könnte schärfer sein."),
    (None, "Fleisch war frisch und gut gewürzt."),
    (Some("Lena"), "Lange Schlange, aber es lohnt sich."),
    (Some("Tobi"), "Preis ist okay, Gemüse etwas wenig."),
    (None, "Bestellung kam genau so wie gewünscht."),
    (Some("Ayse"), "Präsentation top, komme wieder!"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("🚀 Seeding sample comments and ratings");

    let config = Config::from_env()?;
    ensure_database_dir(&config.database.url)?;
    let store = Arc::new(SqliteDocumentStore::connect(&config.database.url).await?);
    println!("✅ Connected to {}", config.database.url);

    let table = RankingTable::load(&FileSnapshot::new(&config.site.dataset_path)).await?;
    println!("📋 {} vendors in {}", table.records().len(), config.site.dataset_path);

    for (index, vendor) in table.records().iter().enumerate() {
        let comments = seed_comments(store.clone(), &vendor.name, index).await?;
        let ratings = seed_ratings(store.clone(), &vendor.name, index).await?;
        println!("  {} - {} comments, {} ratings", vendor.name, comments, ratings);
    }

    println!("🎉 Sample data ready");
    Ok(())
}

async fn seed_comments(store: Arc<SqliteDocumentStore>, vendor: &str, offset: usize) -> AppResult<usize> {
    let collection = CollectionPath::comments(vendor);
    let now = Utc::now();
    // Vary the count per vendor so some feeds stay below one page
    let count = 2 + (offset * 3) % (SAMPLE_COMMENTS.len() + 2);

    for i in 0..count {
        let (name, body) = SAMPLE_COMMENTS[(offset + i) % SAMPLE_COMMENTS.len()];
        let age = Duration::hours((i as i64 + 1) * (offset as i64 % 5 + 1) * 7);
        let mut document = NewComment::new(name, body, now - age).into_document()?;
        document.insert(UPVOTES_FIELD.to_string(), json!((offset + i * 2) % 9));
        store.insert(&collection, document).await?;
    }
    Ok(count)
}

async fn seed_ratings(store: Arc<SqliteDocumentStore>, vendor: &str, offset: usize) -> AppResult<usize> {
    let count = 1 + offset % 4;
    for i in 0..count {
        let user = AnonymousUser::from(uuid::Uuid::new_v4().to_string());
        let panel = RatingPanel::new(store.clone(), vendor, user);
        let rating = 4.0 + ((offset + i * 3) % 7) as f64;
        panel.submit(rating).await?;
    }
    Ok(count)
}
