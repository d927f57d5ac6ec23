//! `/auth` routes — registration, login, profile, password change.

use axum::{
    extract::{Extension, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{hash_password, validate_password_strength, verify_password},
    errors::{AppError, AppResult},
    extract::Json,
    middleware::auth_guard::AuthUser,
    models::{User, UserRole},
    repo::{SqlValue, ToColumns},
    response,
    state::AppState,
};

// ── Request / response types ──────────────────────────────────

#[derive(Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username:   String,
    #[validate(email(message = "Invalid email address"))]
    email:      String,
    password:   String,
    first_name: Option<String>,
    last_name:  Option<String>,
    phone:      Option<String>,
    role:       UserRole,
    school_id:  Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email:    String,
    password: String,
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password:     String,
}

#[derive(Serialize)]
struct UserSummary {
    id:         String,
    username:   String,
    email:      String,
    role:       UserRole,
    school_id:  Option<String>,
    first_name: Option<String>,
    last_name:  Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id:         user.id.clone(),
            username:   user.username.clone(),
            email:      user.email.clone(),
            role:       user.role,
            school_id:  user.school_id.clone(),
            first_name: user.first_name.clone(),
            last_name:  user.last_name.clone(),
        }
    }
}

#[derive(Serialize)]
struct AuthPayload {
    user:  UserSummary,
    token: String,
}

struct NewUser<'a> {
    body: &'a RegisterRequest,
    password_hash: String,
}

impl ToColumns for NewUser<'_> {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("username", self.body.username.clone().into()),
            ("email", self.body.email.clone().into()),
            ("password_hash", self.password_hash.clone().into()),
            ("first_name", self.body.first_name.clone().into()),
            ("last_name", self.body.last_name.clone().into()),
            ("phone", self.body.phone.clone().into()),
            ("role", self.body.role.into()),
            ("school_id", self.body.school_id.clone().into()),
            ("is_active", true.into()),
        ]
    }
}

// ── Routers ───────────────────────────────────────────────────

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /auth/register — create an account and issue a token.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    validate_password_strength(&body.password)?;

    if state.repos.users.find_by_email(pool, &body.email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }
    if state.repos.users.find_by_username(pool, &body.username).await?.is_some() {
        return Err(AppError::BadRequest("Username already taken".into()));
    }

    let password_hash = hash_password(&body.password, state.config.hash_time_cost)?;
    let id = Uuid::new_v4().to_string();
    let new_user = NewUser { body: &body, password_hash };

    let user = state.repos.users.table.insert(pool, &id, &new_user).await?;

    let token = state
        .jwt
        .issue(&user.id, &user.email, user.role, user.school_id.clone())?;

    Ok(response::created(AuthPayload { user: UserSummary::from(&user), token }))
}

/// POST /auth/login — verify credentials and issue a token.
///
/// Unknown email and wrong password both answer with the same
/// `InvalidCredentials` error, so the response does not reveal which
/// accounts exist. A deactivated account is rejected distinctly (403).
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let user = state
        .repos
        .users
        .find_by_email(pool, &body.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    verify_password(&body.password, &user.password_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    if !user.is_active {
        return Err(AppError::Forbidden("Your account has been deactivated".into()));
    }

    state.repos.users.stamp_last_login(pool, &user.id).await?;

    let token = state
        .jwt
        .issue(&user.id, &user.email, user.role, user.school_id.clone())?;

    Ok(response::ok_with_message(
        AuthPayload { user: UserSummary::from(&user), token },
        "Login successful",
    ))
}

/// GET /auth/me — return the profile behind the presented token.
async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .repos
        .users
        .table
        .find_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(response::ok(UserSummary::from(&user)))
}

/// POST /auth/change-password — re-verify the current password, then store
/// a new hash.
async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let user = state
        .repos
        .users
        .table
        .find_by_id(pool, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    verify_password(&body.current_password, &user.password_hash)
        .map_err(|_| AppError::Unauthorized)?;
    validate_password_strength(&body.new_password)?;

    let hash = hash_password(&body.new_password, state.config.hash_time_cost)?;
    state.repos.users.set_password_hash(pool, &user.id, &hash).await?;

    Ok(response::message("Password changed successfully"))
}
