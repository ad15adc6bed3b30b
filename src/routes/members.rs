use crate::{
    error::Result,
    models::member::RegisterMemberRequest,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register_member))
        .route("/:id", get(get_member))
}

async fn register_member(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterMemberRequest>,
) -> Result<Json<Value>> {
    let member = state.member_service.register(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": member
    })))
}

async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<String>,
) -> Result<Json<Value>> {
    let member = state.member_service.get_member(&member_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": member
    })))
}
