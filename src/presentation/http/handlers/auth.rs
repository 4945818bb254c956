//! Authentication Handlers

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{LoginRequest, RegisterRequest};
use crate::application::dto::response::{RegisterResponse, TokenResponse, UserResponse};
use crate::application::services::{AuthError, AuthService, AuthServiceImpl};
use crate::domain::UserRepository;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn auth_service(state: &AppState) -> AuthServiceImpl<dyn UserRepository> {
    AuthServiceImpl::new(
        state.users.clone(),
        state.snowflake.clone(),
        state.settings.jwt.clone(),
    )
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (user, tokens) = auth_service(&state)
        .register(body.username.trim(), body.email.trim(), &body.password)
        .await?;

    let response = RegisterResponse {
        user: UserResponse::from(user),
        token: TokenResponse::from(tokens),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = auth_service(&state)
        .authenticate(body.email.trim(), &body.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                tracing::info!(email = %body.email, "Failed login attempt");
                AppError::Unauthorized("Invalid email or password".into())
            }
            other => other.into(),
        })?;

    Ok(Json(TokenResponse::from(tokens)))
}

/// Get the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(UserResponse::from(user)))
}
