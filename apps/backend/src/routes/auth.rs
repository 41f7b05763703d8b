//! Authentication endpoints and middleware

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};
use crate::AppState;

/// Authenticated user info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub token: String,
}

/// Auth middleware - resolves the bearer token to a session
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    // Extract Bearer token
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?
        .to_string();

    // Look up session by token
    let session = state
        .db
        .get_session_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))?;

    // Store authenticated user in request extensions
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: session.user_id,
        token,
    });

    Ok(next.run(request).await)
}

/// POST /api/auth/register - create an account with its initial stats row
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let name = request.name.trim().to_string();
    if name.len() < 2 || name.len() > 50 {
        return Err(ApiError::BadRequest(
            "Name must be 2-50 characters".to_string(),
        ));
    }

    let email = request.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(ApiError::BadRequest("Valid email required".to_string()));
    }

    if request.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)?;
    let user = state.db.create_user(&name, &email, &password_hash).await?;

    // The stats row is created once, at account creation
    let initial = state.engine.initial_stats();
    state.db.get_or_create_stats(user.id, &initial).await?;

    let session = state.db.create_session(user.id).await?;

    tracing::info!("Registered new user: {}", user.id);

    Ok(Json(AuthResponse {
        user: user.to_api_user(),
        token: session.token,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = request.email.trim().to_lowercase();

    // One message for both failure modes, so the endpoint does not
    // reveal which emails are registered
    let user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let session = state.db.create_session(user.id).await?;

    Ok(Json(AuthResponse {
        user: user.to_api_user(),
        token: session.token,
    }))
}

/// POST /api/auth/logout - invalidate the presented session token
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_session(&auth.token).await?;
    Ok(Json(serde_json::json!({ "logged_out": deleted })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfile>> {
    let user = state
        .db
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_api_user()))
}

/// Hash a password with argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored argon2 hash string
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Cheap shape check: something@something.something
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
