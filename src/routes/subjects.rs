//! `/subjects` routes — subject catalogue CRUD.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    extract::{Json, Query},
    middleware::{auth_guard::AuthUser, role_guard::require_director, school_scope::assert_school_scope},
    repo::{patch_field, Filter, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/subjects", axum::routing::post(create_subject))
        .route(
            "/subjects/{id}",
            axum::routing::put(update_subject).delete(delete_subject),
        )
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/subjects", get(list_subjects))
        .route("/subjects/{id}", get(get_subject))
        .merge(writes)
}

#[derive(Deserialize)]
struct ListQuery {
    school_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateSubjectBody {
    school_id:   String,
    name:        String,
    code:        Option<String>,
    description: Option<String>,
    coefficient: Option<f64>,
}

impl ToColumns for CreateSubjectBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("school_id", self.school_id.clone().into()),
            ("name", self.name.clone().into()),
            ("code", self.code.clone().into()),
            ("description", self.description.clone().into()),
            ("coefficient", self.coefficient.unwrap_or(1.0).into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateSubjectBody {
    name:        Option<String>,
    code:        Option<String>,
    description: Option<String>,
    coefficient: Option<f64>,
}

impl ToColumns for UpdateSubjectBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "name", self.name);
        patch_field!(cols, "code", self.code);
        patch_field!(cols, "description", self.description);
        patch_field!(cols, "coefficient", self.coefficient);
        cols
    }
}

async fn assert_owns_subject(state: &AppState, user: &AuthUser, subject_id: &str) -> AppResult<()> {
    let subject = state
        .repos
        .subjects
        .find_by_id(&state.pool, subject_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(user, &subject.school_id)
}

async fn list_subjects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let school_id = match query.school_id {
        Some(id) => id,
        None => user.school_id.clone().ok_or_else(AppError::forbidden)?,
    };
    assert_school_scope(&user, &school_id)?;

    let filter = Filter::new().eq("school_id", school_id);
    let subjects = state.repos.subjects.find_all(&state.pool, &filter).await?;
    Ok(response::ok(subjects))
}

async fn get_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let subject = state
        .repos
        .subjects
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &subject.school_id)?;
    Ok(response::ok(subject))
}

async fn create_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateSubjectBody>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &body.school_id)?;

    let id = Uuid::new_v4().to_string();
    let subject = state.repos.subjects.insert(&state.pool, &id, &body).await?;
    Ok(response::created(subject))
}

async fn update_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSubjectBody>,
) -> AppResult<impl IntoResponse> {
    assert_owns_subject(&state, &user, &id).await?;
    let subject = state.repos.subjects.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(subject, "Subject updated successfully"))
}

async fn delete_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_owns_subject(&state, &user, &id).await?;
    let deleted = state.repos.subjects.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Subject deleted successfully"))
}
