//! `/users` routes — account listing and administration.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::{
    errors::{AppError, AppResult},
    extract::{Json, Query},
    middleware::{auth_guard::AuthUser, role_guard::require_director, school_scope::assert_school_scope},
    models::UserRole,
    repo::{patch_field, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route(
            "/users/{id}",
            axum::routing::put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .merge(writes)
}

#[derive(Deserialize)]
struct ListQuery {
    role:      UserRole,
    school_id: Option<String>,
}

#[derive(Deserialize)]
struct UpdateUserBody {
    username:   Option<String>,
    first_name: Option<String>,
    last_name:  Option<String>,
    phone:      Option<String>,
    is_active:  Option<bool>,
}

impl ToColumns for UpdateUserBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "username", self.username);
        patch_field!(cols, "first_name", self.first_name);
        patch_field!(cols, "last_name", self.last_name);
        patch_field!(cols, "phone", self.phone);
        patch_field!(cols, "is_active", self.is_active);
        cols
    }
}

async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let school_id = match query.school_id {
        Some(id) => id,
        None => user.school_id.clone().ok_or_else(AppError::forbidden)?,
    };
    assert_school_scope(&user, &school_id)?;

    let users = state
        .repos
        .users
        .find_by_role(&state.pool, query.role, Some(&school_id))
        .await?;
    Ok(response::ok(users))
}

/// A user may fetch their own account; directors may fetch any account in
/// their school's membership.
async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let target = state
        .repos
        .users
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    if target.id != user.user_id {
        if user.role != UserRole::SchoolDirector {
            return Err(AppError::forbidden());
        }
        match &target.school_id {
            Some(school) => assert_school_scope(&user, school)?,
            None => return Err(AppError::forbidden()),
        }
    }
    Ok(response::ok(target))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> AppResult<impl IntoResponse> {
    let target = state
        .repos
        .users
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    match &target.school_id {
        Some(school) => assert_school_scope(&user, school)?,
        None => return Err(AppError::forbidden()),
    }

    let updated = state.repos.users.table.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(updated, "User updated successfully"))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if id == user.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    let target = state
        .repos
        .users
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    match &target.school_id {
        Some(school) => assert_school_scope(&user, school)?,
        None => return Err(AppError::forbidden()),
    }

    let deleted = state.repos.users.table.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("User deleted successfully"))
}
