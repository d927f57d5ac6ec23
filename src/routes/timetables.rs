//! `/timetable` routes — weekly lesson slots per class.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    extract::{Json, Query},
    middleware::{auth_guard::AuthUser, role_guard::require_director, school_scope::assert_school_scope},
    models::DayOfWeek,
    repo::{patch_field, Filter, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/timetable", axum::routing::post(create_entry))
        .route(
            "/timetable/{id}",
            axum::routing::put(update_entry).delete(delete_entry),
        )
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/timetable", get(list_entries))
        .merge(writes)
}

#[derive(Deserialize)]
struct ListQuery {
    class_id:    String,
    day_of_week: Option<DayOfWeek>,
}

#[derive(Deserialize)]
struct CreateEntryBody {
    class_id:       String,
    subject_id:     String,
    teacher_id:     Option<String>,
    day_of_week:    DayOfWeek,
    start_time:     NaiveTime,
    end_time:       NaiveTime,
    room:           Option<String>,
    school_year_id: Option<String>,
}

impl ToColumns for CreateEntryBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("class_id", self.class_id.clone().into()),
            ("subject_id", self.subject_id.clone().into()),
            ("teacher_id", self.teacher_id.clone().into()),
            ("day_of_week", self.day_of_week.into()),
            ("start_time", self.start_time.into()),
            ("end_time", self.end_time.into()),
            ("room", self.room.clone().into()),
            ("school_year_id", self.school_year_id.clone().into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdateEntryBody {
    subject_id:  Option<String>,
    teacher_id:  Option<String>,
    day_of_week: Option<DayOfWeek>,
    start_time:  Option<NaiveTime>,
    end_time:    Option<NaiveTime>,
    room:        Option<String>,
}

impl ToColumns for UpdateEntryBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "subject_id", self.subject_id);
        patch_field!(cols, "teacher_id", self.teacher_id);
        patch_field!(cols, "day_of_week", self.day_of_week);
        patch_field!(cols, "start_time", self.start_time);
        patch_field!(cols, "end_time", self.end_time);
        patch_field!(cols, "room", self.room);
        cols
    }
}

fn validate_times(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if end <= start {
        return Err(AppError::BadRequest("end_time must be after start_time".into()));
    }
    Ok(())
}

/// Scope runs through the class the slot belongs to.
async fn assert_owns_class(state: &AppState, user: &AuthUser, class_id: &str) -> AppResult<()> {
    let class = state
        .repos
        .classes
        .find_by_id(&state.pool, class_id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(user, &class.school_id)
}

async fn list_entries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    assert_owns_class(&state, &user, &query.class_id).await?;

    let mut filter = Filter::new().eq("class_id", query.class_id);
    if let Some(day) = query.day_of_week {
        filter = filter.eq("day_of_week", day);
    }
    let entries = state.repos.timetables.find_all(&state.pool, &filter).await?;
    Ok(response::ok(entries))
}

async fn create_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateEntryBody>,
) -> AppResult<impl IntoResponse> {
    assert_owns_class(&state, &user, &body.class_id).await?;
    validate_times(body.start_time, body.end_time)?;

    let id = Uuid::new_v4().to_string();
    let entry = state.repos.timetables.insert(&state.pool, &id, &body).await?;
    Ok(response::created(entry))
}

async fn update_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEntryBody>,
) -> AppResult<impl IntoResponse> {
    let existing = state
        .repos
        .timetables
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_class(&state, &user, &existing.class_id).await?;

    let start = body.start_time.unwrap_or(existing.start_time);
    let end = body.end_time.unwrap_or(existing.end_time);
    validate_times(start, end)?;

    let entry = state.repos.timetables.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(entry, "Timetable entry updated successfully"))
}

async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let existing = state
        .repos
        .timetables
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_class(&state, &user, &existing.class_id).await?;

    let deleted = state.repos.timetables.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Timetable entry deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_must_end_after_it_starts() {
        assert!(validate_times(t(8, 0), t(9, 0)).is_ok());
        assert!(matches!(validate_times(t(9, 0), t(9, 0)), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_times(t(10, 0), t(8, 30)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn create_body_covers_all_slot_columns() {
        let body = CreateEntryBody {
            class_id:       "c1".into(),
            subject_id:     "s1".into(),
            teacher_id:     None,
            day_of_week:    DayOfWeek::Lundi,
            start_time:     t(8, 0),
            end_time:       t(9, 0),
            room:           Some("B12".into()),
            school_year_id: None,
        };
        let cols = body.columns();
        let names: Vec<_> = cols.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "class_id",
                "subject_id",
                "teacher_id",
                "day_of_week",
                "start_time",
                "end_time",
                "room",
                "school_year_id",
            ]
        );
        assert!(matches!(cols[3].1, SqlValue::Text(ref day) if day == "lundi"));
    }

    #[test]
    fn patch_skips_absent_fields() {
        let body = UpdateEntryBody {
            subject_id:  None,
            teacher_id:  None,
            day_of_week: Some(DayOfWeek::Jeudi),
            start_time:  None,
            end_time:    None,
            room:        Some("A3".into()),
        };
        let cols = body.columns();
        let names: Vec<_> = cols.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["day_of_week", "room"]);
    }
}
