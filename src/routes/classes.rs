//! `/classes` routes — class CRUD via the generic repository.

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
        .route("/classes", axum::routing::post(create_class))
        .route(
            "/classes/{id}",
            axum::routing::put(update_class).delete(delete_class),
        )
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/classes", get(list_classes))
        .route("/classes/{id}", get(get_class))
        .merge(writes)
}

#[derive(Deserialize)]
struct ListQuery {
    school_id:      Option<String>,
    school_year_id: Option<String>,
    level:          Option<String>,
}

#[derive(Deserialize)]
struct CreateClassBody {
    school_id:      String,
    name:           String,
    level:          Option<String>,
    section:        Option<String>,
    capacity:       Option<i32>,
    teacher_id:     Option<String>,
    school_year_id: Option<String>,
}

impl ToColumns for CreateClassBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("school_id", self.school_id.clone().into()),
            ("name", self.name.clone().into()),
            ("level", self.level.clone().into()),
            ("section", self.section.clone().into()),
            ("capacity", self.capacity.unwrap_or(0).into()),
            ("teacher_id", self.teacher_id.clone().into()),
            ("school_year_id", self.school_year_id.clone().into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateClassBody {
    name:           Option<String>,
    level:          Option<String>,
    section:        Option<String>,
    capacity:       Option<i32>,
    teacher_id:     Option<String>,
    school_year_id: Option<String>,
}

impl ToColumns for UpdateClassBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "name", self.name);
        patch_field!(cols, "level", self.level);
        patch_field!(cols, "section", self.section);
        patch_field!(cols, "capacity", self.capacity);
        patch_field!(cols, "teacher_id", self.teacher_id);
        patch_field!(cols, "school_year_id", self.school_year_id);
        cols
    }
}

async fn assert_owns_class(state: &AppState, user: &AuthUser, class_id: &str) -> AppResult<()> {
    let class = state
        .repos
        .classes
        .find_by_id(&state.pool, class_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(user, &class.school_id)
}

async fn list_classes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let school_id = match query.school_id {
        Some(id) => id,
        None => user.school_id.clone().ok_or_else(AppError::forbidden)?,
    };
    assert_school_scope(&user, &school_id)?;

    let filter = Filter::new()
        .eq("school_id", school_id)
        .eq_opt("school_year_id", query.school_year_id)
        .eq_opt("level", query.level);
    let classes = state.repos.classes.find_all(&state.pool, &filter).await?;
    Ok(response::ok(classes))
}

async fn get_class(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let class = state
        .repos
        .classes
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &class.school_id)?;
    Ok(response::ok(class))
}

async fn create_class(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateClassBody>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &body.school_id)?;

    let id = Uuid::new_v4().to_string();
    let class = state.repos.classes.insert(&state.pool, &id, &body).await?;
    Ok(response::created(class))
}

async fn update_class(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateClassBody>,
) -> AppResult<impl IntoResponse> {
    assert_owns_class(&state, &user, &id).await?;
    let class = state.repos.classes.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(class, "Class updated successfully"))
}

async fn delete_class(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    assert_owns_class(&state, &user, &id).await?;
    let deleted = state.repos.classes.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Class deleted successfully"))
}
