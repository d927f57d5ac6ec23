use axum::{middleware, response::IntoResponse, routing::get, Json, Router};

use crate::{middleware::auth_guard::require_auth, state::AppState};

mod attendance;
mod auth;
mod classes;
mod grades;
mod notifications;
mod payments;
mod reports;
mod schools;
mod students;
mod subjects;
mod teachers;
mod timetables;
mod users;

/// Build the full `/api` router.
///
/// `/health`, `/auth/register` and `/auth/login` are public; every other
/// route is wrapped in the bearer-token [`require_auth`] middleware.
pub fn all_routes(state: AppState) -> Router<AppState> {
    let auth_mw = middleware::from_fn_with_state(state, require_auth);
    Router::new()
        .route("/health", get(health))
        .merge(auth::public_router())
        .merge(
            Router::new()
                .merge(auth::protected_router())
                .merge(users::router())
                .merge(schools::router())
                .merge(classes::router())
                .merge(subjects::router())
                .merge(students::router())
                .merge(teachers::router())
                .merge(timetables::router())
                .merge(grades::router())
                .merge(attendance::router())
                .merge(payments::router())
                .merge(notifications::router())
                .merge(reports::router())
                .route_layer(auth_mw),
        )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "OK", "message": "Ekele API is running" }))
}
