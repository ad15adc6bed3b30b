use crate::{
    error::Result,
    models::calendar::{CreateCalendarRequest, DeleteCalendarsRequest, EditCalendarRequest},
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
        .route("/", post(create_calendar).delete(delete_calendars))
        .route("/my", get(my_calendars))
        .route("/recent", get(recent_calendars))
        .route(
            "/:id",
            get(get_calendar).put(update_calendar).delete(delete_calendar),
        )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: usize,
    size: Option<usize>,
}

async fn create_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<CreateCalendarRequest>,
) -> Result<Json<Value>> {
    let calendar = state
        .calendar_service
        .create_calendar(&user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": calendar
    })))
}

async fn my_calendars(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let per_page = query.size.unwrap_or(state.config.default_reviews_per_page);
    let calendars = state
        .calendar_service
        .my_calendars(&user_id, query.page, per_page)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": calendars
    })))
}

async fn recent_calendars(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let calendars = state.calendar_service.recent_calendars(5).await?;

    Ok(Json(json!({
        "success": true,
        "data": calendars
    })))
}

async fn get_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(calendar_id): Path<String>,
) -> Result<Json<Value>> {
    let calendar = state
        .calendar_service
        .get_calendar(&calendar_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": calendar
    })))
}

async fn update_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(calendar_id): Path<String>,
    Json(request): Json<EditCalendarRequest>,
) -> Result<Json<Value>> {
    let calendar = state
        .calendar_service
        .update_calendar(&calendar_id, &user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": calendar
    })))
}

async fn delete_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(calendar_id): Path<String>,
) -> Result<Json<Value>> {
    state
        .calendar_service
        .delete_calendar(&calendar_id, &user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Calendar deleted successfully"
    })))
}

async fn delete_calendars(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<DeleteCalendarsRequest>,
) -> Result<Json<Value>> {
    state
        .calendar_service
        .delete_calendars(&user_id, &request.calendar_ids)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Calendars deleted successfully"
    })))
}
