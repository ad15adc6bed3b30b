use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, Router},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use crate::{
    config::Config,
    services::{
        media::InMemoryBlobStore, CalendarService, CommentService, CommunityService, MediaService,
        MemberService, ReviewService, Store,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Wayfarer service...");

    let store = Arc::new(Store::new());
    let blob_store = Arc::new(InMemoryBlobStore::new());

    let member_service = MemberService::new(store.clone());
    let media_service = MediaService::new(store.clone(), blob_store);
    let review_service = ReviewService::new(store.clone(), media_service.clone());
    let comment_service = CommentService::new(
        store.clone(),
        review_service.clone(),
        config.comment_moderation_policy,
    );
    let community_service = CommunityService::new(store.clone());
    let calendar_service = CalendarService::new(store.clone());

    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        member_service,
        review_service,
        comment_service,
        community_service,
        calendar_service,
        media_service,
    });

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(
            config
                .cors_allowed_origins
                .split(',')
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/members", routes::members::router())
        .nest("/api/reviews", routes::reviews::router())
        .nest("/api/comments", routes::comments::router())
        .nest("/api/communities", routes::communities::router())
        .nest("/api/calendars", routes::calendars::router())
        .nest("/api/media", routes::media::router())
        .nest("/api/diagnostics", routes::diagnostics::router())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "Wayfarer is running!"
}
