//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type and its mapping from service errors
//! - Token extraction and identity resolution
//! - Extractors for authenticated and optional users

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::identity::IdentityProvider;
use crate::models::Identity;
use crate::moderation::ModerationError;
use crate::services::{ModerationService, ModerationServiceError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub moderation_service: Arc<ModerationService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// User resolved from the request, if any
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Identity>);

/// Marks a request whose token could not be checked because the identity
/// provider failed
#[derive(Debug, Clone, Copy)]
struct IdentityUnavailable;

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    fn status_code(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" | "ILLEGAL_TRANSITION" | "NOT_EDITABLE" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<ModerationServiceError> for ApiError {
    fn from(err: ModerationServiceError) -> Self {
        match err {
            ModerationServiceError::NotFound(msg) => ApiError::not_found(msg),
            ModerationServiceError::IllegalTransition(ModerationError::IllegalTransition {
                from,
                to,
                role,
            }) => ApiError::with_details(
                "ILLEGAL_TRANSITION",
                "Action not permitted, please refresh",
                serde_json::json!({ "from": from, "to": to, "role": role }),
            ),
            ModerationServiceError::NotEditable { status, role } => ApiError::with_details(
                "NOT_EDITABLE",
                format!("Content in status {} cannot be edited", status),
                serde_json::json!({ "status": status, "role": role }),
            ),
            ModerationServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ModerationServiceError::InternalError(e) => {
                tracing::error!("Moderation service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

/// Extract session token from request
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Identity resolution middleware
///
/// Resolves the request token, if there is one, and stores the identity in
/// the request extensions. Unknown tokens continue as anonymous; handlers
/// that need a user reject them through `AuthenticatedUser`.
///
/// If the provider itself fails the request also continues as anonymous, so
/// public reads keep working. `AuthenticatedUser` then answers 500 instead
/// of 401.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&request) {
        match state.identity_provider.resolve(&token).await {
            Ok(Some(identity)) => {
                request.extensions_mut().insert(AuthenticatedUser(identity));
            }
            Ok(None) => tracing::debug!("Unknown or expired token, continuing as anonymous"),
            Err(e) => {
                tracing::warn!("Identity lookup failed, continuing as anonymous: {:#}", e);
                request.extensions_mut().insert(IdentityUnavailable);
            }
        }
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }
        if parts.extensions.get::<IdentityUnavailable>().is_some() {
            return Err(ApiError::internal_error("Identity lookup failed"));
        }
        Err(ApiError::unauthorized("Authentication required"))
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.0.clone()),
        ))
    }
}
