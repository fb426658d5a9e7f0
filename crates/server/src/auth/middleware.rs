// Session resolution and the login gate
// Decision: Resolve the session once per request in middleware, before any
// handler runs; protected handlers opt in with the AuthUser extractor
// Decision: A bad cookie is anonymous, not an error; only the gate says 401

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::cookies::{self, SESSION_COOKIE};
use crate::AppState;
use hushd_core::Identity;

/// Authentication error returned by the gate
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Resolve the session cookie into an `Identity` on request extensions.
///
/// Runs for every request before route dispatch. When the cookie was
/// signed with a rotated key, the response leaves with a fresh cookie
/// under the current key, so rotation never forces a logout.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut refreshed = None;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match state.sessions.decode(cookie.value()) {
            Some(decoded) => {
                if !decoded.current_key {
                    // Re-sign under the current key; if encoding fails the
                    // old cookie simply stays until its next request
                    if let Ok(token) = state.sessions.encode(&decoded.identity) {
                        refreshed =
                            Some(cookies::session(token, state.config.session.max_age));
                    }
                }
                request.extensions_mut().insert(decoded.identity);
            }
            None => {
                // Failed verification: the request proceeds as anonymous
                // and the gate decides
                tracing::debug!("session cookie failed verification");
            }
        }
    }

    let response = next.run(request).await;

    match refreshed {
        // The jar only emits its delta, so this sets exactly one cookie
        Some(cookie) => (jar.add(cookie), response).into_response(),
        None => response,
    }
}

/// Extractor gating protected routes on a resolved identity.
/// Rejects with 401 and a structured body when the request is anonymous.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AuthError::unauthorized("You must log in!"))
    }
}
