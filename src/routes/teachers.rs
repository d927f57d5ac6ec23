//! `/teachers` routes — staff CRUD and subject assignments.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    extract::{Json, Query},
    middleware::{auth_guard::AuthUser, role_guard::require_director, school_scope::assert_school_scope},
    models::TeacherStatus,
    repo::{patch_field, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/teachers", axum::routing::post(create_teacher))
        .route(
            "/teachers/{id}",
            axum::routing::put(update_teacher).delete(delete_teacher),
        )
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/teachers", get(list_teachers))
        .route("/teachers/{id}", get(get_teacher))
        .route("/teachers/{id}/subjects", get(teacher_subjects))
        .merge(writes)
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    school_id: Option<String>,
    status:    Option<TeacherStatus>,
}

#[derive(Deserialize)]
struct CreateTeacherBody {
    user_id:        String,
    school_id:      String,
    teacher_number: String,
    qualification:  Option<String>,
    specialization: Option<String>,
    hire_date:      Option<NaiveDate>,
    status:         Option<TeacherStatus>,
}

impl ToColumns for CreateTeacherBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("user_id", self.user_id.clone().into()),
            ("school_id", self.school_id.clone().into()),
            ("teacher_number", self.teacher_number.clone().into()),
            ("qualification", self.qualification.clone().into()),
            ("specialization", self.specialization.clone().into()),
            ("hire_date", self.hire_date.into()),
            ("status", self.status.unwrap_or(TeacherStatus::Active).into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateTeacherBody {
    teacher_number: Option<String>,
    qualification:  Option<String>,
    specialization: Option<String>,
    hire_date:      Option<NaiveDate>,
    status:         Option<TeacherStatus>,
}

impl ToColumns for UpdateTeacherBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "teacher_number", self.teacher_number);
        patch_field!(cols, "qualification", self.qualification);
        patch_field!(cols, "specialization", self.specialization);
        patch_field!(cols, "hire_date", self.hire_date);
        patch_field!(cols, "status", self.status);
        cols
    }
}

// ── Scope helper ─────────────────────────────────────────────

async fn assert_owns_teacher(state: &AppState, user: &AuthUser, teacher_id: &str) -> AppResult<()> {
    let teacher = state
        .repos
        .teachers
        .table
        .find_by_id(&state.pool, teacher_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(user, &teacher.school_id)
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_teachers(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let school_id = match query.school_id {
        Some(id) => id,
        None => user.school_id.clone().ok_or_else(AppError::forbidden)?,
    };
    assert_school_scope(&user, &school_id)?;

    let teachers = state
        .repos
        .teachers
        .find_by_school(&state.pool, &school_id, query.status)
        .await?;
    Ok(response::ok(teachers))
}

async fn get_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let teacher = state
        .repos
        .teachers
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &teacher.school_id)?;
    Ok(response::ok(teacher))
}

async fn teacher_subjects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_owns_teacher(&state, &user, &id).await?;
    let subjects = state.repos.teachers.subjects(&state.pool, &id).await?;
    Ok(response::ok(subjects))
}

async fn create_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTeacherBody>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &body.school_id)?;

    let id = Uuid::new_v4().to_string();
    let teacher = state.repos.teachers.table.insert(&state.pool, &id, &body).await?;
    Ok(response::created(teacher))
}

async fn update_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTeacherBody>,
) -> AppResult<impl IntoResponse> {
    assert_owns_teacher(&state, &user, &id).await?;
    let teacher = state.repos.teachers.table.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(teacher, "Teacher updated successfully"))
}

async fn delete_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_owns_teacher(&state, &user, &id).await?;
    let deleted = state.repos.teachers.table.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Teacher deleted successfully"))
}
