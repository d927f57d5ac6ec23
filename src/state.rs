//! Shared application state — injected into every handler via `axum::extract::State`.

use crate::{auth::jwt::Jwt, config::Config, db::Db, repo::Repositories};

/// Application-wide state passed via axum `State<AppState>`.
///
/// Cheap to clone: the pool is `Arc`-backed, the JWT keys are small and the
/// repositories are zero-sized table handles.
#[derive(Clone)]
pub struct AppState {
    pub pool:   Db,
    pub config: Config,
    pub jwt:    Jwt,
    pub repos:  Repositories,
}
