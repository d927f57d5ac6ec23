//! `/grades` routes — transcripts, grade entry and class summaries.
//!
//! Grades are entered by teachers and directors alike; the school-scope
//! check goes through the student the grade belongs to.

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
    models::ExamType,
    repo::{patch_field, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/grades", get(list_grades).post(create_grade))
        .route("/grades/{id}", put(update_grade).delete(delete_grade))
        .route("/grades/class/{class_id}/summary", get(class_summary))
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    student_id:     String,
    school_year_id: Option<String>,
}

#[derive(Deserialize)]
struct SummaryQuery {
    subject_id: String,
    exam_type:  ExamType,
}

#[derive(Deserialize)]
struct CreateGradeBody {
    student_id:     String,
    subject_id:     String,
    class_id:       String,
    school_year_id: String,
    exam_type:      ExamType,
    score:          f64,
    max_score:      f64,
    exam_date:      Option<NaiveDate>,
    remarks:        Option<String>,
    teacher_id:     Option<String>,
}

impl ToColumns for CreateGradeBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("student_id", self.student_id.clone().into()),
            ("subject_id", self.subject_id.clone().into()),
            ("class_id", self.class_id.clone().into()),
            ("school_year_id", self.school_year_id.clone().into()),
            ("exam_type", self.exam_type.into()),
            ("score", self.score.into()),
            ("max_score", self.max_score.into()),
            ("exam_date", self.exam_date.into()),
            ("remarks", self.remarks.clone().into()),
            ("teacher_id", self.teacher_id.clone().into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateGradeBody {
    exam_type: Option<ExamType>,
    score:     Option<f64>,
    max_score: Option<f64>,
    exam_date: Option<NaiveDate>,
    remarks:   Option<String>,
}

impl ToColumns for UpdateGradeBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "exam_type", self.exam_type);
        patch_field!(cols, "score", self.score);
        patch_field!(cols, "max_score", self.max_score);
        patch_field!(cols, "exam_date", self.exam_date);
        patch_field!(cols, "remarks", self.remarks);
        cols
    }
}

// ── Scope helpers ────────────────────────────────────────────

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

fn validate_scores(score: f64, max_score: f64) -> AppResult<()> {
    if score < 0.0 || max_score <= 0.0 || score > max_score {
        return Err(AppError::BadRequest(
            "Score must be between 0 and the maximum score".into(),
        ));
    }
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_grades(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    assert_owns_student(&state, &user, &query.student_id).await?;
    let grades = state
        .repos
        .grades
        .find_by_student(&state.pool, &query.student_id, query.school_year_id.as_deref())
        .await?;
    Ok(response::ok(grades))
}

async fn class_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<impl IntoResponse> {
    let class = state
        .repos
        .classes
        .find_by_id(&state.pool, &class_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &class.school_id)?;

    let summary = state
        .repos
        .grades
        .class_summary(&state.pool, &class_id, &query.subject_id, query.exam_type)
        .await?;
    Ok(response::ok(summary))
}

async fn create_grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateGradeBody>,
) -> AppResult<impl IntoResponse> {
    validate_scores(body.score, body.max_score)?;
    assert_owns_student(&state, &user, &body.student_id).await?;

    let id = Uuid::new_v4().to_string();
    let grade = state.repos.grades.table.insert(&state.pool, &id, &body).await?;
    Ok(response::created(grade))
}

async fn update_grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateGradeBody>,
) -> AppResult<impl IntoResponse> {
    if let (Some(score), Some(max_score)) = (body.score, body.max_score) {
        validate_scores(score, max_score)?;
    }
    let grade = state
        .repos
        .grades
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_student(&state, &user, &grade.student_id).await?;

    let updated = state.repos.grades.table.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(updated, "Grade updated successfully"))
}

async fn delete_grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let grade = state
        .repos
        .grades
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_student(&state, &user, &grade.student_id).await?;

    let deleted = state.repos.grades.table.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Grade deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_overflowing_scores_are_rejected() {
        assert!(validate_scores(-1.0, 20.0).is_err());
        assert!(validate_scores(5.0, 0.0).is_err());
        assert!(validate_scores(21.0, 20.0).is_err());
        assert!(validate_scores(0.0, 20.0).is_ok());
        assert!(validate_scores(20.0, 20.0).is_ok());
    }
}
