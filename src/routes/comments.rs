use crate::{
    error::Result,
    models::comment::{CreateCommentRequest, UpdateCommentRequest},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/review/:review_id", get(get_review_comments).post(create_comment))
        .route("/:id", patch(update_comment).delete(delete_comment))
}

async fn get_review_comments(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> Result<Json<Value>> {
    let comments = state.comment_service.organize_comments(&review_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": comments
    })))
}

/// Posting a comment responds with the full review view so the client
/// can rerender the thread in one round trip.
async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Value>> {
    let review = state
        .comment_service
        .create_comment(&review_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": review
    })))
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    let review = state
        .comment_service
        .update_comment(&comment_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": review
    })))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>> {
    state
        .comment_service
        .delete_comment(&comment_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
