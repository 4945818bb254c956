//! Authentication Middleware
//!
//! Bearer token validation for protected routes. The token only names the
//! user; privileges and the active flag are read from storage on every
//! request, so a demoted or disabled account loses access immediately.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::services::{claims_user_id, decode_access_token, AuthError};
use crate::domain::Actor;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
    pub is_admin: bool,
}

impl AuthUser {
    /// The identity passed to application services.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_admin: self.is_admin,
        }
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    // Check for Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let claims = decode_access_token(&state.settings.jwt.secret, token)?;
    let user_id = claims_user_id(&claims)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    if !user.is_active {
        return Err(AuthError::Inactive.into());
    }

    let actor = user.actor();
    request.extensions_mut().insert(AuthUser {
        user_id: actor.user_id,
        is_admin: actor.is_admin,
    });

    // Continue to the next handler
    Ok(next.run(request).await)
}
