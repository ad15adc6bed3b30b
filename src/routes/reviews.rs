use crate::{
    error::Result,
    models::review::{Area, ReviewRequest},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_review).get(list_reviews))
        .route("/top", get(top_reviews))
        .route("/:id", get(get_review).put(update_review).delete(delete_review))
        .route("/:id/like", post(toggle_like))
        .route("/:id/view", post(record_view))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: usize,
    size: Option<usize>,
    area: Option<Area>,
    tag: Option<String>,
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Value>> {
    let review = state.review_service.post_review(&user_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": review
    })))
}

async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let per_page = query.size.unwrap_or(state.config.default_reviews_per_page);
    let reviews = match query.tag {
        Some(tag) => {
            state
                .review_service
                .search_by_tag(&tag, query.page, per_page)
                .await?
        }
        None => {
            state
                .review_service
                .list_reviews(query.page, per_page, query.area)
                .await?
        }
    };

    Ok(Json(json!({
        "success": true,
        "data": reviews
    })))
}

async fn top_reviews(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let reviews = state.review_service.top_reviews(5).await?;

    Ok(Json(json!({
        "success": true,
        "data": reviews
    })))
}

/// Detail view; counts as a visit.
async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> Result<Json<Value>> {
    let review = state.review_service.get_review_detail(&review_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": review
    })))
}

async fn update_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Value>> {
    let review = state
        .review_service
        .update_review(&review_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": review
    })))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<String>,
) -> Result<Json<Value>> {
    state
        .review_service
        .delete_review(&review_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review deleted successfully"
    })))
}

async fn toggle_like(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<String>,
) -> Result<Json<Value>> {
    let result = state
        .review_service
        .toggle_like(&review_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "result": result }
    })))
}

async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> Result<Json<Value>> {
    let view_count = state.review_service.record_view(&review_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "view_count": view_count }
    })))
}
