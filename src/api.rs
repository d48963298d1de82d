// HTTP surface for the ranking page, the comment feed and the rating panel

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    identity::AnonymousUser,
    infrastructure::document_store::{CollectionPath, DocumentQuery, DocumentStore, PageCursor},
    models::{
        comment::{TIMESTAMP_FIELD, UPVOTES_FIELD},
        CommentEntry, NewComment, RatingEntry, SortDirection, SortKey,
    },
    rating::{RatingPanel, RatingSummary},
    ranking::{RankingTable, SnapshotSource, SortState, LOAD_ERROR_MESSAGE},
};

#[derive(Deserialize)]
pub struct RankingParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentListParams {
    pub limit: Option<u32>,
    /// Opaque cursor returned as `next_cursor` by a previous page
    pub after: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub name: Option<String>,
    pub comment: String,
}

#[derive(Deserialize)]
pub struct UpvoteRequest {
    pub delta: i64,
}

#[derive(Deserialize)]
pub struct RatingRequest {
    pub rating: f64,
}

#[derive(Serialize)]
pub struct ColumnHeader {
    pub key: SortKey,
    pub label: &'static str,
    pub indicator: Option<SortDirection>,
}

#[derive(Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentEntry>,
    pub next_cursor: Option<String>,
}

async fn load_table(state: &AppState) -> AppResult<RankingTable> {
    RankingTable::load(state.snapshot.as_ref()).await.map_err(|e| {
        if e.is_load_failure() {
            AppError::ServiceUnavailable(LOAD_ERROR_MESSAGE.to_string())
        } else {
            e
        }
    })
}

fn parse_sort(params: &RankingParams) -> AppResult<Option<SortState>> {
    let Some(sort) = params.sort.as_deref() else {
        return Ok(None);
    };
    let key: SortKey = sort.parse()?;
    let direction = match params.order.as_deref() {
        Some(order) => order.parse()?,
        None => SortState::initial_direction(key),
    };
    Ok(Some(SortState { key, direction }))
}

// HTTP Handlers

pub async fn health_check_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "doener-ranking",
        "timestamp": Utc::now().timestamp_millis(),
    }))
}

pub async fn dataset_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let payload = state.snapshot.fetch().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload))
}

pub async fn ranking_handler(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<Value>, AppError> {
    let sort = parse_sort(&params)?;
    let mut table = load_table(&state).await?;
    if let Some(sort) = sort {
        table.sort_by(sort);
    }
    if let Some(q) = params.q.as_deref() {
        table.apply_filter(q);
    }

    let columns: Vec<ColumnHeader> = SortKey::ALL
        .iter()
        .map(|&key| ColumnHeader {
            key,
            label: key.label(),
            indicator: table.sort_indicator(key),
        })
        .collect();

    Ok(Json(json!({
        "sort": table.sort_state(),
        "filter": table.filter(),
        "columns": columns,
        "rows": table.render(),
    })))
}

pub async fn vendor_handler(
    State(state): State<AppState>,
    AxumPath(vendor): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let table = load_table(&state).await?;
    let record = table
        .vendor(&vendor)
        .ok_or_else(|| AppError::NotFound(format!("Vendor {} not found", vendor)))?;
    Ok(Json(serde_json::to_value(record)?))
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    AxumPath(vendor): AxumPath<String>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<CommentPage>, AppError> {
    let mut query = DocumentQuery::ordered_by(TIMESTAMP_FIELD, SortDirection::Descending);
    // A first page without an explicit limit gets the configured size;
    // follow-up pages without one return the remainder
    match (params.limit, params.after.as_deref()) {
        (Some(limit), _) => query = query.limit(limit),
        (None, None) => query = query.limit(state.config.feed.page_size),
        (None, Some(_)) => {}
    }
    if let Some(after) = params.after.as_deref() {
        query = query.start_after(PageCursor::decode(after)?);
    }

    let collection = CollectionPath::comments(vendor);
    let page = state.store.query(&collection, query).await?;
    let comments = page
        .documents
        .into_iter()
        .filter_map(|document| match CommentEntry::from_document(document) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping comment in {}: {}", collection, e);
                None
            }
        })
        .collect();

    Ok(Json(CommentPage {
        comments,
        next_cursor: page.next_cursor.map(|cursor| cursor.encode()).transpose()?,
    }))
}

pub async fn count_comments_handler(
    State(state): State<AppState>,
    AxumPath(vendor): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let count = state.store.count(&CollectionPath::comments(vendor)).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    AxumPath(vendor): AxumPath<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let collection = CollectionPath::comments(vendor);
    let document = NewComment::new(req.name.as_deref(), req.comment, Utc::now()).into_document()?;
    let id = state.store.insert(&collection, document).await?;
    info!("Comment {} added to {}", id, collection);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn upvote_handler(
    State(state): State<AppState>,
    AxumPath((vendor, id)): AxumPath<(String, String)>,
    Json(req): Json<UpvoteRequest>,
) -> Result<Json<Value>, AppError> {
    if req.delta != 1 && req.delta != -1 {
        return Err(AppError::Validation("delta must be 1 or -1".to_string()));
    }
    state
        .store
        .increment(&CollectionPath::comments(vendor), &id, UPVOTES_FIELD, req.delta)
        .await?;
    Ok(Json(json!({ "id": id, "delta": req.delta })))
}

pub async fn list_ratings_handler(
    State(state): State<AppState>,
    AxumPath(vendor): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let documents = state.store.get_all(&CollectionPath::ratings(vendor)).await?;
    let summary = RatingSummary::from_documents(&documents, None);
    let ratings: Vec<RatingEntry> = documents.iter().filter_map(RatingEntry::from_document).collect();
    Ok(Json(json!({
        "ratings": ratings,
        "average": summary.average,
        "display": summary.display_average(),
        "count": summary.count,
    })))
}

pub async fn put_rating_handler(
    State(state): State<AppState>,
    AxumPath((vendor, user)): AxumPath<(String, String)>,
    Json(req): Json<RatingRequest>,
) -> Result<Json<Value>, AppError> {
    let panel = RatingPanel::new(state.store.clone(), vendor, AnonymousUser::from(user));
    panel.submit(req.rating).await?;
    let summary = panel.load_and_average().await?;
    Ok(Json(json!({
        "user": panel.user().as_str(),
        "rating": summary.own_rating,
        "average": summary.average,
        "display": summary.display_average(),
    })))
}

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.site.static_dir.clone();
    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/ranking", get(ranking_handler))
        .route("/data/doener.json", get(dataset_handler))
        // Vendor detail page
        .route("/api/vendors/{vendor}", get(vendor_handler))
        .route(
            "/api/vendors/{vendor}/comments",
            get(list_comments_handler).post(create_comment_handler),
        )
        .route("/api/vendors/{vendor}/comments/count", get(count_comments_handler))
        .route("/api/vendors/{vendor}/comments/{id}/upvote", post(upvote_handler))
        .route("/api/vendors/{vendor}/ratings", get(list_ratings_handler))
        .route("/api/vendors/{vendor}/ratings/{user}", put(put_rating_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}
