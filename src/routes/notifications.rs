//! `/notifications` routes — school announcements with per-user fan-out.
//!
//! Broadcasting writes the notification and its recipient rows in one
//! transaction, so a failed fan-out never leaves a half-delivered
//! announcement behind.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::FutureExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db,
    errors::{AppError, AppResult},
    extract::{Json, Query},
    middleware::{auth_guard::AuthUser, role_guard::require_director, school_scope::assert_school_scope},
    models::{Notification, NotificationAudience, NotificationPriority},
    repo::Filter,
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/notifications", axum::routing::post(broadcast))
        .route("/notifications/{id}", axum::routing::delete(delete_notification))
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", axum::routing::put(mark_read))
        .merge(writes)
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    school_id: Option<String>,
}

#[derive(Deserialize)]
struct BroadcastBody {
    school_id:       String,
    title:           String,
    message:         String,
    target_audience: NotificationAudience,
    class_id:        Option<String>,
    priority:        Option<NotificationPriority>,
}

// ── Handlers ─────────────────────────────────────────────────

async fn list_notifications(
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
    let notifications = state.repos.notifications.find_all(&state.pool, &filter).await?;
    Ok(response::ok(notifications))
}

async fn broadcast(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<BroadcastBody>,
) -> AppResult<impl IntoResponse> {
    if body.title.trim().is_empty() || body.message.trim().is_empty() {
        return Err(AppError::BadRequest("Title and message are required".into()));
    }
    if body.target_audience == NotificationAudience::SpecificClass && body.class_id.is_none() {
        return Err(AppError::BadRequest(
            "class_id is required for a class-targeted notification".into(),
        ));
    }
    assert_school_scope(&user, &body.school_id)?;

    let notification_id = Uuid::new_v4().to_string();
    let sender_id = user.user_id.clone();
    let priority = body.priority.unwrap_or(NotificationPriority::Medium);

    let id_for_fetch = notification_id.clone();
    db::transaction(&state.pool, move |tx| {
        async move {
            sqlx::query(
                "INSERT INTO notifications
                   (id, school_id, title, message, target_audience, class_id, priority, is_read, sent_by)
                 VALUES (?, ?, ?, ?, ?, ?, ?, FALSE, ?)",
            )
            .bind(&notification_id)
            .bind(&body.school_id)
            .bind(&body.title)
            .bind(&body.message)
            .bind(body.target_audience.as_str())
            .bind(&body.class_id)
            .bind(priority.as_str())
            .bind(&sender_id)
            .execute(&mut **tx)
            .await?;

            let recipients = resolve_recipients(tx, &body).await?;
            for user_id in recipients {
                sqlx::query(
                    "INSERT INTO notification_recipients (id, notification_id, user_id, is_read)
                     VALUES (?, ?, ?, FALSE)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&notification_id)
                .bind(&user_id)
                .execute(&mut **tx)
                .await?;
            }
            Ok(())
        }
        .boxed()
    })
    .await?;

    let notification = state
        .repos
        .notifications
        .find_by_id(&state.pool, &id_for_fetch)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Broadcast vanished after commit")))?;
    Ok(response::created(notification))
}

/// Resolves the user ids a broadcast should reach, inside the same
/// transaction as the notification insert.
async fn resolve_recipients(
    tx: &mut sqlx::Transaction<'static, sqlx::MySql>,
    body: &BroadcastBody,
) -> AppResult<Vec<String>> {
    let rows: Vec<(String,)> = match body.target_audience {
        NotificationAudience::All => {
            sqlx::query_as(
                "SELECT user_id FROM teachers WHERE school_id = ?
                 UNION
                 SELECT user_id FROM students WHERE school_id = ? AND user_id IS NOT NULL",
            )
            .bind(&body.school_id)
            .bind(&body.school_id)
            .fetch_all(&mut **tx)
            .await?
        }
        NotificationAudience::Teachers => {
            sqlx::query_as("SELECT user_id FROM teachers WHERE school_id = ?")
                .bind(&body.school_id)
                .fetch_all(&mut **tx)
                .await?
        }
        NotificationAudience::Students | NotificationAudience::Parents => {
            sqlx::query_as(
                "SELECT user_id FROM students WHERE school_id = ? AND user_id IS NOT NULL",
            )
            .bind(&body.school_id)
            .fetch_all(&mut **tx)
            .await?
        }
        NotificationAudience::SpecificClass => {
            sqlx::query_as(
                "SELECT user_id FROM students
                 WHERE class_id = ? AND school_id = ? AND user_id IS NOT NULL",
            )
            .bind(body.class_id.as_deref().unwrap_or_default())
            .bind(&body.school_id)
            .fetch_all(&mut **tx)
            .await?
        }
    };
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query(
        "UPDATE notification_recipients
         SET is_read = TRUE, read_at = NOW()
         WHERE notification_id = ? AND user_id = ?",
    )
    .bind(&id)
    .bind(&user.user_id)
    .execute(&state.pool)
    .await
    .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Notification marked as read"))
}

async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let notification: Notification = state
        .repos
        .notifications
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_school_scope(&user, &notification.school_id)?;

    db::transaction(&state.pool, move |tx| {
        async move {
            sqlx::query("DELETE FROM notification_recipients WHERE notification_id = ?")
                .bind(&id)
                .execute(&mut **tx)
                .await?;
            sqlx::query("DELETE FROM notifications WHERE id = ?")
                .bind(&id)
                .execute(&mut **tx)
                .await?;
            Ok(())
        }
        .boxed()
    })
    .await?;

    Ok(response::message("Notification deleted successfully"))
}
