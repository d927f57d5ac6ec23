//! `/reports` routes — school-level aggregates for the dashboard.

use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppResult,
    extract::Query,
    middleware::{auth_guard::AuthUser, school_scope::assert_school_scope},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/students/{school_id}", get(student_report))
        .route("/reports/attendance/{school_id}", get(attendance_report))
        .route("/reports/grades/{school_id}", get(grade_report))
        .route("/reports/payments/{school_id}", get(payment_report))
}

// ── Report rows ──────────────────────────────────────────────

#[derive(Serialize, sqlx::FromRow)]
struct StudentsPerClass {
    class_name:    Option<String>,
    level:         Option<String>,
    student_count: i64,
}

#[derive(Serialize, sqlx::FromRow)]
struct StudentReport {
    total_students:     i64,
    active_students:    i64,
    suspended_students: i64,
    graduated_students: i64,
}

#[derive(Serialize)]
struct StudentReportPayload {
    summary:   StudentReport,
    per_class: Vec<StudentsPerClass>,
}

#[derive(Serialize, sqlx::FromRow)]
struct AttendanceReport {
    total_records: i64,
    present_count: i64,
    absent_count:  i64,
    late_count:    i64,
}

#[derive(Serialize, sqlx::FromRow)]
struct GradeReportRow {
    subject_name:  String,
    average_score: Option<f64>,
    highest_score: Option<f64>,
    lowest_score:  Option<f64>,
    grade_count:   i64,
}

#[derive(Serialize, sqlx::FromRow)]
struct PaymentReport {
    total_collected:  Option<f64>,
    total_payments:   i64,
    pending_payments: i64,
}

// ── Queries ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct DateRangeQuery {
    date_from: Option<NaiveDate>,
    date_to:   Option<NaiveDate>,
}

#[derive(Deserialize)]
struct YearQuery {
    school_year_id: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────

async fn student_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &school_id)?;

    let summary = sqlx::query_as::<_, StudentReport>(
        "SELECT COUNT(*) AS total_students,
                CAST(COALESCE(SUM(status = 'active'), 0) AS SIGNED)    AS active_students,
                CAST(COALESCE(SUM(status = 'suspended'), 0) AS SIGNED) AS suspended_students,
                CAST(COALESCE(SUM(status = 'graduated'), 0) AS SIGNED) AS graduated_students
         FROM students WHERE school_id = ?",
    )
    .bind(&school_id)
    .fetch_one(&state.pool)
    .await?;

    let per_class = sqlx::query_as::<_, StudentsPerClass>(
        "SELECT c.name AS class_name, c.level, COUNT(s.id) AS student_count
         FROM students s
         LEFT JOIN classes c ON c.id = s.class_id
         WHERE s.school_id = ? AND s.status = 'active'
         GROUP BY c.id, c.name, c.level
         ORDER BY c.name",
    )
    .bind(&school_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(response::ok(StudentReportPayload { summary, per_class }))
}

async fn attendance_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &school_id)?;

    let mut sql = String::from(
        "SELECT COUNT(*) AS total_records,
                CAST(COALESCE(SUM(a.status = 'present'), 0) AS SIGNED) AS present_count,
                CAST(COALESCE(SUM(a.status = 'absent'), 0) AS SIGNED)  AS absent_count,
                CAST(COALESCE(SUM(a.status = 'late'), 0) AS SIGNED)    AS late_count
         FROM attendance a
         JOIN students s ON s.id = a.student_id
         WHERE s.school_id = ?",
    );
    if query.date_from.is_some() {
        sql.push_str(" AND a.date >= ?");
    }
    if query.date_to.is_some() {
        sql.push_str(" AND a.date <= ?");
    }

    let mut q = sqlx::query_as::<_, AttendanceReport>(&sql).bind(&school_id);
    if let Some(from) = query.date_from {
        q = q.bind(from);
    }
    if let Some(to) = query.date_to {
        q = q.bind(to);
    }
    let report = q.fetch_one(&state.pool).await?;
    Ok(response::ok(report))
}

async fn grade_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
    Query(query): Query<YearQuery>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &school_id)?;

    let mut sql = String::from(
        "SELECT sub.name AS subject_name,
                AVG(g.score / g.max_score * 20) AS average_score,
                MAX(g.score / g.max_score * 20) AS highest_score,
                MIN(g.score / g.max_score * 20) AS lowest_score,
                COUNT(g.id) AS grade_count
         FROM grades g
         JOIN subjects sub ON sub.id = g.subject_id
         JOIN students s ON s.id = g.student_id
         WHERE s.school_id = ?",
    );
    if query.school_year_id.is_some() {
        sql.push_str(" AND g.school_year_id = ?");
    }
    sql.push_str(" GROUP BY sub.id, sub.name ORDER BY sub.name");

    let mut q = sqlx::query_as::<_, GradeReportRow>(&sql).bind(&school_id);
    if let Some(year) = &query.school_year_id {
        q = q.bind(year);
    }
    let rows = q.fetch_all(&state.pool).await?;
    Ok(response::ok(rows))
}

async fn payment_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &school_id)?;

    let report = sqlx::query_as::<_, PaymentReport>(
        "SELECT SUM(CASE WHEN p.status = 'completed' THEN p.amount_paid END) AS total_collected,
                COUNT(*) AS total_payments,
                CAST(COALESCE(SUM(p.status = 'pending'), 0) AS SIGNED) AS pending_payments
         FROM payments p
         JOIN students s ON s.id = p.student_id
         WHERE s.school_id = ?",
    )
    .bind(&school_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(response::ok(report))
}
