//! Request handlers for the health data API.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{hash_password, verify_password, Role, Session};
use crate::server::state::ServerState;
use crate::store::{StoreError, UserRecord};

/// API failure modes. Internal details are logged at the point of failure
/// and never leak into the response body.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden(&'static str),
    NotFound(&'static str),
    Conflict(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(username) => {
                ApiError::Conflict(format!("username `{username}` is already taken"))
            }
            StoreError::UserNotFound(_) => ApiError::NotFound("User not found"),
            StoreError::Database(e) => {
                error!(error = %e, "Account store failure");
                ApiError::Internal
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub participant_id: String,
    pub role: Role,
    pub expires_in_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub participant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

pub async fn root() -> Json<JsonValue> {
    Json(json!({
        "message": "Health data API",
        "endpoints": [
            "POST /login",
            "POST /logout",
            "POST /signup",
            "GET /api/my-data",
            "GET /api/my-summary",
            "GET /health"
        ]
    }))
}

pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

pub async fn login(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = match state.store.get_by_username(&request.username).await {
        Ok(user) => user,
        Err(StoreError::UserNotFound(_)) => {
            warn!(username = %request.username, "Login attempt for unknown user");
            return Err(ApiError::Unauthorized);
        }
        Err(e) => return Err(e.into()),
    };

    match verify_password(&request.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(username = %user.username, "Invalid password");
            return Err(ApiError::Unauthorized);
        }
        Err(e) => {
            error!(username = %user.username, error = %e, "Password verification failed");
            return Err(ApiError::Internal);
        }
    }

    let role = state.role_for(&user.username);
    let token = state
        .sessions
        .create_session(&user.username, &user.participant_id, role);
    info!(username = %user.username, "Login successful");

    Ok(Json(LoginResponse {
        token,
        participant_id: user.participant_id,
        role,
        expires_in_seconds: state.sessions.timeout_seconds(),
    }))
}

pub async fn logout(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Json<JsonValue> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    Json(json!({ "message": "Logged out" }))
}

pub async fn signup(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<JsonValue>), ApiError> {
    let hash = hash_password(&request.password).map_err(|e| {
        error!(error = %e, "Password hashing failed during signup");
        ApiError::Internal
    })?;
    state
        .store
        .create_user(&request.username, &hash, &request.participant_id)
        .await?;
    info!(username = %request.username, participant_id = %request.participant_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created", "username": request.username })),
    ))
}

pub async fn my_data(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let session = authenticate(&state, &headers)?;
    let document = read_artifact(&state, &session.participant_id)?;
    Ok(Json(document))
}

pub async fn my_summary(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    let session = authenticate(&state, &headers)?;
    let document = read_artifact(&state, &session.participant_id)?;

    let mut summary = serde_json::Map::new();
    if let Some(categories) = document.as_object() {
        for (category, bundle) in categories {
            let latest = bundle
                .get("time_series")
                .and_then(JsonValue::as_array)
                .and_then(|rows| rows.last());
            if let Some(latest) = latest {
                summary.insert(format!("{category}_latest"), latest.clone());
            }
        }
        let lung_metrics = categories
            .get("lung_function")
            .and_then(|bundle| bundle.get("metrics"))
            .cloned()
            .unwrap_or_else(|| json!({}));
        summary.insert("lung_metrics".to_string(), lung_metrics);
    }

    Ok(Json(JsonValue::Object(summary)))
}

pub async fn list_users(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.store.list_users().await?))
}

pub async fn reset_password(
    State(state): State<Arc<ServerState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    require_admin(&state, &headers)?;
    if username == state.config.admin_username {
        return Err(ApiError::Forbidden(
            "The admin account password cannot be reset via the API",
        ));
    }

    let hash = hash_password(&request.password).map_err(|e| {
        error!(error = %e, "Password hashing failed during reset");
        ApiError::Internal
    })?;
    state.store.update_password_hash(&username, &hash).await?;
    info!(username, "Password reset by admin");

    Ok(Json(json!({ "message": "Password updated" })))
}

pub async fn delete_user(
    State(state): State<Arc<ServerState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JsonValue>, ApiError> {
    require_admin(&state, &headers)?;
    if username == state.config.admin_username {
        return Err(ApiError::Forbidden("The admin account cannot be deleted"));
    }

    state.store.delete_user(&username).await?;
    info!(username, "User deleted by admin");

    Ok(Json(json!({ "message": "User deleted" })))
}

/// Pulls the token out of the Authorization header. Accepts both
/// "Bearer <token>" and a raw token value.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}

fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<Session, ApiError> {
    bearer_token(headers)
        .and_then(|token| state.sessions.validate(token))
        .ok_or(ApiError::Unauthorized)
}

fn require_admin(state: &ServerState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let session = authenticate(state, headers)?;
    if session.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin role required"));
    }
    Ok(session)
}

fn read_artifact(state: &ServerState, participant_id: &str) -> Result<JsonValue, ApiError> {
    let path = state.artifact_path(participant_id);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("No data for this participant"));
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Artifact read failed");
            return Err(ApiError::Internal);
        }
    };
    serde_json::from_str(&content).map_err(|e| {
        error!(path = %path.display(), error = %e, "Artifact is not valid JSON");
        ApiError::Internal
    })
}
