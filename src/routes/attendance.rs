//! `/attendance` routes — daily registers, rosters and statistics.

use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    extract::{Json, Query},
    middleware::{auth_guard::AuthUser, school_scope::assert_school_scope},
    models::AttendanceStatus,
    repo::{patch_field, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendance", get(list_attendance).post(record_attendance))
        .route("/attendance/{id}", put(update_attendance).delete(delete_attendance))
        .route("/attendance/class/{class_id}", get(class_roster))
        .route("/attendance/student/{student_id}/stats", get(student_stats))
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    student_id: String,
    date_from:  NaiveDate,
    date_to:    NaiveDate,
}

#[derive(Deserialize)]
struct RosterQuery {
    date: NaiveDate,
}

#[derive(Deserialize)]
struct RecordAttendanceBody {
    student_id: String,
    class_id:   String,
    date:       NaiveDate,
    status:     AttendanceStatus,
    remarks:    Option<String>,
}

struct NewAttendance<'a> {
    body:        &'a RecordAttendanceBody,
    recorded_by: &'a str,
}

impl ToColumns for NewAttendance<'_> {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("student_id", self.body.student_id.clone().into()),
            ("class_id", self.body.class_id.clone().into()),
            ("date", self.body.date.into()),
            ("status", self.body.status.into()),
            ("remarks", self.body.remarks.clone().into()),
            ("recorded_by", self.recorded_by.into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateAttendanceBody {
    status:  Option<AttendanceStatus>,
    remarks: Option<String>,
}

impl ToColumns for UpdateAttendanceBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "status", self.status);
        patch_field!(cols, "remarks", self.remarks);
        cols
    }
}

// ── Scope helper ─────────────────────────────────────────────

async fn assert_owns_student(state: &AppState, user: &AuthUser, student_id: &str) -> AppResult<()> {
    let student = state
        .repos
        .students
        .table
        .find_by_id(&state.pool, student_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown student".into()))?;
    assert_school_scope(user, &student.school_id)
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    assert_owns_student(&state, &user, &query.student_id).await?;
    let records = state
        .repos
        .attendance
        .find_by_student_in_range(&state.pool, &query.student_id, query.date_from, query.date_to)
        .await?;
    Ok(response::ok(records))
}

async fn class_roster(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<String>,
    Query(query): Query<RosterQuery>,
) -> AppResult<impl IntoResponse> {
    let class = state
        .repos
        .classes
        .find_by_id(&state.pool, &class_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &class.school_id)?;

    let roster = state
        .repos
        .attendance
        .class_roster(&state.pool, &class_id, query.date)
        .await?;
    Ok(response::ok(roster))
}

async fn student_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_owns_student(&state, &user, &student_id).await?;
    let counts = state.repos.attendance.status_counts(&state.pool, &student_id).await?;
    Ok(response::ok(counts))
}

async fn record_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RecordAttendanceBody>,
) -> AppResult<impl IntoResponse> {
    assert_owns_student(&state, &user, &body.student_id).await?;

    let id = Uuid::new_v4().to_string();
    let record = NewAttendance { body: &body, recorded_by: &user.user_id };
    let row = state.repos.attendance.table.insert(&state.pool, &id, &record).await?;
    Ok(response::created(row))
}

async fn update_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAttendanceBody>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .repos
        .attendance
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_student(&state, &user, &record.student_id).await?;

    let updated = state.repos.attendance.table.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(updated, "Attendance updated successfully"))
}

async fn delete_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .repos
        .attendance
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_student(&state, &user, &record.student_id).await?;

    let deleted = state.repos.attendance.table.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Attendance record deleted"))
}
