use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::db::{DbPool, LoginRequest, LoginResponse, Session, User, UserResponse, UserRole};
use crate::AppState;

use super::error::ApiError;

/// Sessions live for a fixed eight hours from login
pub const SESSION_LIFETIME_HOURS: i64 = 8;

/// Header accepted as an alternative to `Authorization: Bearer`
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the session token from request headers
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// Issue a new session for `user`
pub async fn create_session(db: &DbPool, user: User) -> Result<LoginResponse, ApiError> {
    let token = generate_token();
    let token_hash = hash_token(&token);

    let expires_at = (chrono::Utc::now() + chrono::Duration::hours(SESSION_LIFETIME_HOURS))
        .to_rfc3339();

    Session::insert(db, user.id, &token_hash, &expires_at).await?;

    Ok(LoginResponse {
        token,
        expires_at,
        user: UserResponse::from(user),
    })
}

/// Resolve a session token to its user.
///
/// Expired sessions are deleted when found. Sessions of deactivated users
/// resolve to `None` but are left in place.
pub async fn validate_session(db: &DbPool, token: &str) -> Result<Option<User>, sqlx::Error> {
    let token_hash = hash_token(token);

    let session = match Session::find_by_token_hash(db, &token_hash).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    if session.is_expired(chrono::Utc::now()) {
        tracing::debug!(user_id = session.user_id, "Removing expired session");
        Session::delete(db, session.id).await?;
        return Ok(None);
    }

    let user = User::find(db, session.user_id).await?;
    Ok(user.filter(|u| u.active()))
}

/// Make sure the bootstrap admin account exists
pub async fn ensure_admin_user(db: &DbPool, username: &str, password: &str) -> anyhow::Result<()> {
    if User::find_by_username(db, username).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;
    User::insert(db, username, &password_hash, UserRole::Admin).await?;

    tracing::info!(username = username, "Created default admin user");
    Ok(())
}

pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator role required"))
    }
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = User::find_by_username(&state.db, request.username.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !user.active() || !verify_password(&request.password, &user.password_hash) {
        tracing::warn!(username = %request.username, "Failed login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let response = create_session(&state.db, user).await?;
    tracing::info!(username = %response.user.username, "User logged in");

    Ok(Json(response))
}

/// Logout endpoint; removes the caller's session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = extract_token(&headers).ok_or_else(|| ApiError::unauthorized("Missing token"))?;
    let removed = Session::delete_by_token_hash(&state.db, &hash_token(&token)).await?;
    if removed {
        tracing::info!("Session ended");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Validate token endpoint; returns the session's user
pub async fn validate(user: User) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Auth middleware: resolves the session and stores its `User` in the
/// request extensions for handlers to extract.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = validate_session(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session is invalid or has expired"))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated user set by `auth_middleware`
#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
