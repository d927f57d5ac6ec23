//! `/schools` routes — school profile and school-year management.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db,
    errors::{AppError, AppResult},
    extract::Json,
    middleware::{auth_guard::AuthUser, role_guard::require_director, school_scope::assert_school_scope},
    models::School,
    repo::{patch_field, Filter, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/schools", axum::routing::post(create_school))
        .route("/schools/{id}", axum::routing::put(update_school))
        .route("/schools/{id}/years", axum::routing::post(create_school_year))
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/schools/{id}", get(get_school))
        .route("/schools/{id}/years", get(list_school_years))
        .merge(writes)
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateSchoolBody {
    name:    String,
    code:    String,
    address: Option<String>,
    city:    Option<String>,
    country: Option<String>,
    phone:   Option<String>,
    email:   Option<String>,
}

#[derive(Deserialize)]
struct UpdateSchoolBody {
    name:      Option<String>,
    address:   Option<String>,
    city:      Option<String>,
    country:   Option<String>,
    phone:     Option<String>,
    email:     Option<String>,
    is_active: Option<bool>,
}

impl ToColumns for UpdateSchoolBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "name", self.name);
        patch_field!(cols, "address", self.address);
        patch_field!(cols, "city", self.city);
        patch_field!(cols, "country", self.country);
        patch_field!(cols, "phone", self.phone);
        patch_field!(cols, "email", self.email);
        patch_field!(cols, "is_active", self.is_active);
        cols
    }
}

#[derive(Deserialize)]
struct CreateSchoolYearBody {
    name:       String,
    start_date: NaiveDate,
    end_date:   NaiveDate,
    is_current: Option<bool>,
}

/// A school profile with its headcounts, for the dashboard.
#[derive(Serialize)]
struct SchoolOverview {
    #[serde(flatten)]
    school:        School,
    student_count: i64,
    teacher_count: i64,
}

// ── Handlers ─────────────────────────────────────────────────

async fn get_school(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &id)?;
    let school = state
        .repos
        .schools
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let student_count = state.repos.students.count_by_school(&state.pool, &id, None).await?;
    let teacher_count = state
        .repos
        .teachers
        .table
        .count(&state.pool, &Filter::new().eq("school_id", id.as_str()))
        .await?;

    Ok(response::ok(SchoolOverview { school, student_count, teacher_count }))
}

/// Creates the school and attaches the director to it in one transaction:
/// either both rows land or neither does. The scope claim reaches the token
/// on the director's next login.
async fn create_school(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateSchoolBody>,
) -> AppResult<impl IntoResponse> {
    // A director administers exactly one school.
    if user.school_id.is_some() {
        return Err(AppError::BadRequest("You already administer a school".into()));
    }
    if body.name.trim().is_empty() || body.code.trim().is_empty() {
        return Err(AppError::BadRequest("School name and code are required".into()));
    }

    let id = Uuid::new_v4().to_string();
    let school_id = id.clone();
    let director_id = user.user_id.clone();
    db::transaction(&state.pool, move |tx| {
        async move {
            sqlx::query(
                "INSERT INTO schools (id, name, code, address, city, country, phone, email, director_id) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&school_id)
            .bind(&body.name)
            .bind(&body.code)
            .bind(&body.address)
            .bind(&body.city)
            .bind(body.country.as_deref().unwrap_or("Niger"))
            .bind(&body.phone)
            .bind(&body.email)
            .bind(&director_id)
            .execute(&mut **tx)
            .await
            .map_err(AppError::from_sqlx)?;

            sqlx::query("UPDATE users SET school_id = ? WHERE id = ?")
                .bind(&school_id)
                .bind(&director_id)
                .execute(&mut **tx)
                .await
                .map_err(AppError::from)?;

            Ok(())
        }
        .boxed()
    })
    .await?;

    let school = state
        .repos
        .schools
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created school missing")))?;
    Ok(response::created(school))
}

async fn update_school(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSchoolBody>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &id)?;
    state
        .repos
        .schools
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let school = state.repos.schools.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(school, "School updated successfully"))
}

async fn list_school_years(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &id)?;
    let filter = Filter::new().eq("school_id", id);
    let years = state.repos.school_years.find_all(&state.pool, &filter).await?;
    Ok(response::ok(years))
}

/// Only one current year per school: the sibling-clearing UPDATE and the
/// INSERT run in the same transaction, so a failed insert cannot leave the
/// school without a current year.
async fn create_school_year(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<CreateSchoolYearBody>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &id)?;
    if body.end_date <= body.start_date {
        return Err(AppError::BadRequest("end_date must be after start_date".into()));
    }

    let year_id = Uuid::new_v4().to_string();
    let new_id = year_id.clone();
    let school_id = id.clone();
    let is_current = body.is_current.unwrap_or(false);
    db::transaction(&state.pool, move |tx| {
        async move {
            if is_current {
                sqlx::query("UPDATE school_years SET is_current = FALSE WHERE school_id = ?")
                    .bind(&school_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(AppError::from)?;
            }

            sqlx::query(
                "INSERT INTO school_years (id, school_id, name, start_date, end_date, is_current) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&new_id)
            .bind(&school_id)
            .bind(&body.name)
            .bind(body.start_date)
            .bind(body.end_date)
            .bind(is_current)
            .execute(&mut **tx)
            .await
            .map_err(AppError::from_sqlx)?;

            Ok(())
        }
        .boxed()
    })
    .await?;

    let year = state
        .repos
        .school_years
        .find_by_id(&state.pool, &year_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created school year missing")))?;
    Ok(response::created(year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::Jwt, config::Config, models::UserRole, repo::Repositories};

    async fn dev_state() -> AppState {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must point at a scratch MySQL database");
        let pool = sqlx::MySqlPool::connect(&url).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let config = Config::from_env().unwrap();
        let jwt = Jwt::new(config.jwt_secret.as_bytes(), config.jwt_expiry_hours);
        AppState { pool, config, jwt, repos: Repositories::new() }
    }

    #[tokio::test]
    #[ignore = "needs a scratch MySQL database via TEST_DATABASE_URL"]
    async fn failed_year_insert_keeps_existing_current_year() {
        let state = dev_state().await;

        let school_id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO schools (id, name, code) VALUES (?, ?, ?)")
            .bind(&school_id)
            .bind("Lycée Témoin")
            .bind(Uuid::new_v4().to_string())
            .execute(&state.pool)
            .await
            .unwrap();

        let year_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO school_years (id, school_id, name, start_date, end_date, is_current) \
             VALUES (?, ?, '2025-2026', '2025-10-01', '2026-06-30', TRUE)",
        )
        .bind(&year_id)
        .bind(&school_id)
        .execute(&state.pool)
        .await
        .unwrap();

        let director = AuthUser {
            user_id:   Uuid::new_v4().to_string(),
            email:     "director@ekele.test".into(),
            role:      UserRole::SchoolDirector,
            school_id: Some(school_id.clone()),
        };
        // A name longer than its column makes the insert fail after the
        // sibling-clearing UPDATE has already run.
        let body = CreateSchoolYearBody {
            name:       "x".repeat(200),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            end_date:   NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
            is_current: Some(true),
        };

        let result = create_school_year(
            State(state.clone()),
            Extension(director),
            Path(school_id.clone()),
            Json(body),
        )
        .await;
        assert!(result.is_err());

        let (still_current,): (bool,) =
            sqlx::query_as("SELECT is_current FROM school_years WHERE id = ?")
                .bind(&year_id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        assert!(still_current, "the pre-existing current year must survive the rollback");
    }
}
