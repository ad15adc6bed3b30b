use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/reviews/:id/likes", get(check_like_count))
}

/// Reconciliation check: does the denormalized like counter match the
/// number of like relations? Operational tooling only; request paths
/// never count relations.
async fn check_like_count(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> Result<Json<Value>> {
    let consistent = state.review_service.verify_like_count(&review_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "consistent": consistent }
    })))
}
