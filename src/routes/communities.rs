use crate::{
    error::Result,
    models::community::{
        CommunityType, CreatePostCommentRequest, CreatePostRequest, UpdatePostCommentRequest,
        UpdatePostRequest,
    },
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_post).get(list_posts))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/comments", post(create_comment))
        .route("/comments/:id", patch(update_comment).delete(delete_comment))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: usize,
    size: Option<usize>,
    #[serde(rename = "type")]
    post_type: Option<CommunityType>,
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Value>> {
    let post = state.community_service.create_post(&user_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let per_page = query.size.unwrap_or(state.config.default_reviews_per_page);
    let posts = state
        .community_service
        .list_posts(query.post_type, query.page, per_page)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": posts
    })))
}

/// Detail view; counts as a visit.
async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let post = state.community_service.get_post_detail(&post_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Value>> {
    let post = state
        .community_service
        .update_post(&post_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    state.community_service.delete_post(&post_id, &user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully"
    })))
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
    Json(request): Json<CreatePostCommentRequest>,
) -> Result<Json<Value>> {
    let post = state
        .community_service
        .create_comment(&post_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
    Json(request): Json<UpdatePostCommentRequest>,
) -> Result<Json<Value>> {
    let post = state
        .community_service
        .update_comment(&comment_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>> {
    state
        .community_service
        .delete_comment(&comment_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
