// handlers/public/accounts.rs - POST /sign-up and POST /sign-in

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, validate_password, validate_username, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub username: String,
    pub token: String,
}

const INVALID_LOGIN: &str = "invalid username or password";

/// POST /sign-up - register a new account and receive a token
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<AuthResponse>)> {
    let request = read_request(payload)?;
    validate_username(&request.username).map_err(ApiError::bad_request)?;
    validate_password(&request.password).map_err(ApiError::bad_request)?;

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to create account")
        })?;

    let user = state.users.create_user(&request.username, &password_hash).await?;
    tracing::info!("Registered user {}", user.username);

    issue(&state, user.username)
}

/// POST /sign-in - exchange valid credentials for a token
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<AuthResponse>)> {
    let request = read_request(payload)?;

    let Some(user) = state.users.find_by_username(&request.username).await? else {
        tracing::warn!("Sign-in for unknown user {}", request.username);
        return Err(ApiError::unauthorized(INVALID_LOGIN));
    };

    let password = request.password;
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await?
        .map_err(|e| {
            tracing::error!("Stored password hash for {} is unreadable: {}", user.username, e);
            ApiError::internal_server_error("Failed to verify credentials")
        })?;

    if !matches {
        tracing::warn!("Wrong password for {}", user.username);
        return Err(ApiError::unauthorized(INVALID_LOGIN));
    }

    issue(&state, user.username)
}

fn read_request(payload: Result<Json<AuthRequest>, JsonRejection>) -> ApiResult<AuthRequest> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e.body_text())))?;

    match (request.username.is_empty(), request.password.is_empty()) {
        (true, true) => Err(ApiError::bad_request("username and password are required")),
        (true, false) => Err(ApiError::bad_request("username is required")),
        (false, true) => Err(ApiError::bad_request("password is required")),
        (false, false) => Ok(request),
    }
}

fn issue(state: &AppState, username: String) -> ApiResult<(HeaderMap, Json<AuthResponse>)> {
    let token = state.tokens.issue(&username)?;

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&token)
        .map_err(|_| ApiError::internal_server_error("Failed to issue access token"))?;
    headers.insert(header::AUTHORIZATION, value);

    Ok((headers, Json(AuthResponse { username, token })))
}
