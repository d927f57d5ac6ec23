use std::net::SocketAddr;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod middleware;
mod models;
mod repo;
mod response;
mod routes;
mod state;

use auth::jwt::Jwt;
use repo::Repositories;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ───────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── Config ────────────────────────────────────────────────
    let config = config::Config::from_env()?;
    tracing::info!(env = %config.app_env, "Starting Ekele backend");

    // ── Database ──────────────────────────────────────────────
    let pool = db::connect(&config).await?;
    db::run_migrations(&pool).await?;

    let jwt = Jwt::new(config.jwt_secret.as_bytes(), config.jwt_expiry_hours);
    let app_state = AppState {
        pool,
        jwt,
        repos: Repositories::new(),
        config,
    };

    let addr: SocketAddr = format!(
        "{}:{}",
        app_state.config.backend_host, app_state.config.backend_port
    )
    .parse()?;

    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // ── Router ────────────────────────────────────────────────
    let app = Router::new()
        .nest("/api", routes::all_routes(app_state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);
    tracing::info!(%addr, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
