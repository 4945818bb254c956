//! Authentication Service
//!
//! Handles registration, credential checks, JWT access tokens and the
//! startup administrator account.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{AdminSettings, JwtSettings};
use crate::domain::{User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new (non-admin) user
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, AuthTokens), AuthError>;

    /// Authenticate user with credentials
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError>;

    /// Get current user from access token
    async fn get_current_user(&self, access_token: &str) -> Result<User, AuthError>;

    /// Create the configured administrator if no account uses its email yet.
    ///
    /// Returns the created user, or `None` when nothing had to be done.
    async fn ensure_admin(&self, admin: &AdminSettings) -> Result<Option<User>, AuthError>;
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    Inactive,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailExists,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for AuthError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Conflict(_) => AuthError::EmailExists,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials
            | AuthError::Inactive
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::UserNotFound => AppError::Unauthorized(e.to_string()),
            AuthError::EmailExists | AuthError::UsernameExists => AppError::Conflict(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Decode and validate an HS256 access token signed with `secret`.
pub fn decode_access_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// User id carried in `claims`.
pub fn claims_user_id(claims: &Claims) -> Result<i64, AuthError> {
    claims.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
}

/// AuthService implementation
pub struct AuthServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
}

impl<U> AuthServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    /// Create a new AuthServiceImpl
    pub fn new(
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
    ) -> Self {
        Self {
            user_repo,
            id_generator,
            jwt_settings,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Generate an access token for `user_id`
    fn generate_tokens(&self, user_id: i64) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }

    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        if self.user_repo.email_exists(email).await? {
            return Err(AuthError::EmailExists);
        }
        if self.user_repo.username_exists(username).await? {
            return Err(AuthError::UsernameExists);
        }

        let user = User {
            id: self.id_generator.generate(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: self.hash_password(password)?,
            is_active: true,
            is_admin,
            created_at: Utc::now(),
        };

        Ok(self.user_repo.create(&user).await?)
    }
}

#[async_trait]
impl<U> AuthService for AuthServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, AuthTokens), AuthError> {
        let user = self.insert_user(username, email, password, false).await?;
        let tokens = self.generate_tokens(user.id)?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok((user, tokens))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        self.generate_tokens(user.id)
    }

    async fn get_current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = decode_access_token(&self.jwt_settings.secret, access_token)?;
        let user_id = claims_user_id(&claims)?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn ensure_admin(&self, admin: &AdminSettings) -> Result<Option<User>, AuthError> {
        let (Some(email), Some(password)) = (admin.email.as_deref(), admin.password.as_deref())
        else {
            return Ok(None);
        };

        if self.user_repo.email_exists(email).await? {
            return Ok(None);
        }

        let user = self
            .insert_user(&admin.username, email, password, true)
            .await?;
        tracing::info!(user_id = user.id, email, "Administrator account created");
        Ok(Some(user))
    }
}
