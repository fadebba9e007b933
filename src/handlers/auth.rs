// src/handlers/auth.rs

use axum::{Form, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, conflict_on_unique},
    models::user::{CreateUserRequest, LoginForm, ROLE_COMUM, TokenResponse, USER_COLUMNS, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Self-registered accounts are always `comum` and start inactive until an admin
/// approves them. Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user: User = sqlx::query_as(&format!(
        r#"
        INSERT INTO users (username, email, password, role, is_active)
        VALUES ($1, $2, $3, $4, FALSE)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(payload.username.trim())
    .bind(payload.email.trim().to_lowercase())
    .bind(&hashed_password)
    .bind(ROLE_COMUM)
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Username or email already registered"))?;

    tracing::info!("New user registered: {} (pending approval)", user.username);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a bearer token.
///
/// `username` may be the username or the email. Inactive accounts get 403.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Form(payload): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let identifier = payload.username.trim();

    let user: Option<User> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = LOWER($1)"
    ))
    .bind(identifier)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Incorrect username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Incorrect username or password".to_string()));
    }

    if !user.is_active {
        tracing::warn!("Login refused for inactive user {}", user.username);
        return Err(AppError::Forbidden("Account pending approval".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
    }))
}
