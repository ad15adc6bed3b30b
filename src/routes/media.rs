use crate::{
    error::{AppError, Result},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews/:review_id/images", post(upload_review_image))
        .route(
            "/reviews/:review_id/images/:image_id",
            axum::routing::delete(delete_review_image),
        )
}

async fn upload_review_image(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::FileUpload(e.to_string()))?
        .ok_or_else(|| AppError::FileUpload("no file in request".to_string()))?;

    let filename = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::FileUpload(e.to_string()))?
        .to_vec();

    let image = state
        .media_service
        .upload_review_image(&review_id, &user_id, &filename, bytes)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": image
    })))
}

async fn delete_review_image(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path((review_id, image_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    state
        .media_service
        .delete_review_image(&review_id, &image_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Image deleted successfully"
    })))
}
