//! `/payments` and `/fees` routes — fee definitions, payment recording and
//! school revenue.

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
    models::{PaymentMethod, PaymentStatus},
    repo::{patch_field, Filter, SqlValue, ToColumns},
    response,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let writes = Router::new()
        .route("/payments", axum::routing::post(record_payment))
        .route(
            "/payments/{id}",
            axum::routing::put(update_payment).delete(delete_payment),
        )
        .route("/fees", axum::routing::post(create_fee))
        .route_layer(middleware::from_fn(require_director));

    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments/revenue/{school_id}", get(school_revenue))
        .route("/fees", get(list_fees))
        .merge(writes)
}

// ── Payload types ────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    student_id: Option<String>,
    status:     Option<PaymentStatus>,
}

#[derive(Deserialize)]
struct RevenueQuery {
    date_from: Option<NaiveDate>,
    date_to:   Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RecordPaymentBody {
    student_id:       String,
    fee_id:           String,
    amount_paid:      f64,
    payment_date:     NaiveDate,
    payment_method:   PaymentMethod,
    reference_number: Option<String>,
    status:           Option<PaymentStatus>,
    remarks:          Option<String>,
}

struct NewPayment<'a> {
    body:        &'a RecordPaymentBody,
    recorded_by: &'a str,
}

impl ToColumns for NewPayment<'_> {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("student_id", self.body.student_id.clone().into()),
            ("fee_id", self.body.fee_id.clone().into()),
            ("amount_paid", self.body.amount_paid.into()),
            ("payment_date", self.body.payment_date.into()),
            ("payment_method", self.body.payment_method.into()),
            ("reference_number", self.body.reference_number.clone().into()),
            ("status", self.body.status.unwrap_or(PaymentStatus::Completed).into()),
            ("remarks", self.body.remarks.clone().into()),
            ("recorded_by", self.recorded_by.into()),
        ]
    }
}

#[derive(Deserialize)]
struct UpdatePaymentBody {
    amount_paid:      Option<f64>,
    payment_date:     Option<NaiveDate>,
    payment_method:   Option<PaymentMethod>,
    reference_number: Option<String>,
    status:           Option<PaymentStatus>,
    remarks:          Option<String>,
}

impl ToColumns for UpdatePaymentBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        patch_field!(cols, "amount_paid", self.amount_paid);
        patch_field!(cols, "payment_date", self.payment_date);
        patch_field!(cols, "payment_method", self.payment_method);
        patch_field!(cols, "reference_number", self.reference_number);
        patch_field!(cols, "status", self.status);
        patch_field!(cols, "remarks", self.remarks);
        cols
    }
}

#[derive(Deserialize)]
struct CreateFeeBody {
    school_id:      String,
    name:           String,
    description:    Option<String>,
    amount:         f64,
    class_id:       Option<String>,
    school_year_id: Option<String>,
    is_mandatory:   Option<bool>,
}

impl ToColumns for CreateFeeBody {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("school_id", self.school_id.clone().into()),
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("amount", self.amount.into()),
            ("class_id", self.class_id.clone().into()),
            ("school_year_id", self.school_year_id.clone().into()),
            ("is_mandatory", self.is_mandatory.unwrap_or(true).into()),
        ]
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

async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    match query.student_id {
        Some(student_id) => {
            assert_owns_student(&state, &user, &student_id).await?;
            let payments = state.repos.payments.find_by_student(&state.pool, &student_id).await?;
            Ok(response::ok(payments).into_response())
        }
        None => {
            // No student given: list the caller's whole school.
            let school_id = user.school_id.clone().ok_or_else(AppError::forbidden)?;
            let payments = state
                .repos
                .payments
                .find_by_school(&state.pool, &school_id, query.status)
                .await?;
            Ok(response::ok(payments).into_response())
        }
    }
}

async fn school_revenue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(school_id): Path<String>,
    Query(query): Query<RevenueQuery>,
) -> AppResult<impl IntoResponse> {
    assert_school_scope(&user, &school_id)?;
    let revenue = state
        .repos
        .payments
        .school_revenue(&state.pool, &school_id, query.date_from, query.date_to)
        .await?;
    Ok(response::ok(revenue))
}

async fn record_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RecordPaymentBody>,
) -> AppResult<impl IntoResponse> {
    if body.amount_paid < 0.0 {
        return Err(AppError::BadRequest("Amount paid must be non-negative".into()));
    }
    assert_owns_student(&state, &user, &body.student_id).await?;

    let id = Uuid::new_v4().to_string();
    let record = NewPayment { body: &body, recorded_by: &user.user_id };
    let payment = state.repos.payments.table.insert(&state.pool, &id, &record).await?;
    Ok(response::created(payment))
}

async fn update_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePaymentBody>,
) -> AppResult<impl IntoResponse> {
    if matches!(body.amount_paid, Some(amount) if amount < 0.0) {
        return Err(AppError::BadRequest("Amount paid must be non-negative".into()));
    }
    let payment = state
        .repos
        .payments
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_student(&state, &user, &payment.student_id).await?;

    let updated = state.repos.payments.table.update(&state.pool, &id, &body).await?;
    Ok(response::ok_with_message(updated, "Payment updated successfully"))
}

async fn delete_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let payment = state
        .repos
        .payments
        .table
        .find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    assert_owns_student(&state, &user, &payment.student_id).await?;

    let deleted = state.repos.payments.table.delete(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(response::message("Payment deleted successfully"))
}

// ── Fees ─────────────────────────────────────────────────────

async fn list_fees(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FeeListQuery>,
) -> AppResult<impl IntoResponse> {
    let school_id = match query.school_id {
        Some(id) => id,
        None => user.school_id.clone().ok_or_else(AppError::forbidden)?,
    };
    assert_school_scope(&user, &school_id)?;

    let filter = Filter::new().eq("school_id", school_id);
    let fees = state.repos.fees.find_all(&state.pool, &filter).await?;
    Ok(response::ok(fees))
}

#[derive(Deserialize)]
struct FeeListQuery {
    school_id: Option<String>,
}

async fn create_fee(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateFeeBody>,
) -> AppResult<impl IntoResponse> {
    if body.amount < 0.0 {
        return Err(AppError::BadRequest("Fee amount must be non-negative".into()));
    }
    assert_school_scope(&user, &body.school_id)?;

    let id = Uuid::new_v4().to_string();
    let fee = state.repos.fees.insert(&state.pool, &id, &body).await?;
    Ok(response::created(fee))
}
