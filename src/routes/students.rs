//! `/students` routes — roster CRUD, director-gated for writes.

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
    models::StudentStatus,
    repo::{patch_field, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/students", axum::routing::post(create_student))
        .route(
            "/students/{id}",
            axum::routing::put(update_student).delete(delete_student),
        )
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/students", get(list_students))
        .route("/students/{id}", get(get_student))
        .merge(writes)
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    school_id: Option<String>,
    class_id:  Option<String>,
    status:    Option<StudentStatus>,
}

#[derive(Deserialize)]
struct CreateStudentBody {
    school_id:       String,
    student_number:  String,
    first_name:      String,
    last_name:       String,
    date_of_birth:   Option<NaiveDate>,
    gender:          Option<String>,
    address:         Option<String>,
    phone:           Option<String>,
    parent_name:     Option<String>,
    parent_phone:    Option<String>,
    parent_email:    Option<String>,
    class_id:        Option<String>,
    enrollment_date: Option<NaiveDate>,
    status:          Option<StudentStatus>,
    user_id:         Option<String>,
}

impl ToColumns for CreateStudentBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("school_id", self.school_id.clone().into()),
            ("student_number", self.student_number.clone().into()),
            ("first_name", self.first_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("date_of_birth", self.date_of_birth.into()),
            ("gender", self.gender.clone().into()),
            ("address", self.address.clone().into()),
            ("phone", self.phone.clone().into()),
            ("parent_name", self.parent_name.clone().into()),
            ("parent_phone", self.parent_phone.clone().into()),
            ("parent_email", self.parent_email.clone().into()),
            ("class_id", self.class_id.clone().into()),
            ("enrollment_date", self.enrollment_date.into()),
            ("status", self.status.unwrap_or(StudentStatus::Active).into()),
            ("user_id", self.user_id.clone().into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateStudentBody {
    student_number:  Option<String>,
    first_name:      Option<String>,
    last_name:       Option<String>,
    date_of_birth:   Option<NaiveDate>,
    gender:          Option<String>,
    address:         Option<String>,
    phone:           Option<String>,
    parent_name:     Option<String>,
    parent_phone:    Option<String>,
    parent_email:    Option<String>,
    class_id:        Option<String>,
    enrollment_date: Option<NaiveDate>,
    status:          Option<StudentStatus>,
}

impl ToColumns for UpdateStudentBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "student_number", self.student_number);
        patch_field!(cols, "first_name", self.first_name);
        patch_field!(cols, "last_name", self.last_name);
        patch_field!(cols, "date_of_birth", self.date_of_birth);
        patch_field!(cols, "gender", self.gender);
        patch_field!(cols, "address", self.address);
        patch_field!(cols, "phone", self.phone);
        patch_field!(cols, "parent_name", self.parent_name);
        patch_field!(cols, "parent_phone", self.parent_phone);
        patch_field!(cols, "parent_email", self.parent_email);
        patch_field!(cols, "class_id", self.class_id);
        patch_field!(cols, "enrollment_date", self.enrollment_date);
        patch_field!(cols, "status", self.status);
        cols
    }
}

// ── Scope helper ─────────────────────────────────────────────

async fn assert_owns_student(state: &AppState, user: &AuthUser, student_id: &str) -> AppResult<String> {
    let student = state
        .repos
        .students
        .table
        .find_by_id(&state.pool, student_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(user, &student.school_id)?;
    Ok(student.school_id)
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_students(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    // Listing is always constrained to the caller's own school.
    if let Some(ref school_id) = query.school_id {
        assert_school_scope(&user, school_id)?;
    }

    let students = match (&query.school_id, &query.class_id) {
        (Some(school_id), class_id) => {
            state
                .repos
                .students
                .find_filtered(pool, Some(school_id), class_id.as_deref(), query.status)
                .await?
        }
        (None, Some(class_id)) => {
            let class = state
                .repos
                .classes
                .find_by_id(pool, class_id)
                .await?
                .ok_or(AppError::NotFound)?;
            assert_school_scope(&user, &class.school_id)?;
            state.repos.students.find_by_class(pool, class_id).await?
        }
        (None, None) => {
            let school_id = user.school_id.clone().ok_or_else(AppError::forbidden)?;
            state
                .repos
                .students
                .find_by_school(pool, &school_id, query.status)
                .await?
        }
    };

    Ok(response::ok(students))
}

async fn get_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let details = state
        .repos
        .students
        .with_details(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &details.student.school_id)?;
    Ok(response::ok(details))
}

async fn create_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateStudentBody>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &body.school_id)?;

    let id = Uuid::new_v4().to_string();
    let student = state.repos.students.table.insert(&state.pool, &id, &body).await?;
    Ok(response::created(student))
}

async fn update_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStudentBody>,
) -> AppResult<impl IntoResponse> {
    assert_owns_student(&state, &user, &id).await?;
    let student = state.repos.students.table.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(student, "Student updated successfully"))
}

async fn delete_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_owns_student(&state, &user, &id).await?;
    let deleted = state.repos.students.table.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Student deleted successfully"))
}
