// Page routes: landing page, the protected secret, and the failure page

use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::services::ServeFile;

use crate::auth::AuthUser;
use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route_service(
            "/",
            ServeFile::new(state.config.public_dir.join("index.html")),
        )
        .route("/secret", get(secret))
        .route("/failure", get(failure))
        .route("/health", get(health))
}

/// GET /secret - The protected resource. The `AuthUser` extractor is the
/// gate: anonymous requests never reach the handler body.
async fn secret(AuthUser(identity): AuthUser) -> &'static str {
    tracing::debug!(user = %identity.id, "secret served");
    "Your personal secret value is 42!"
}

/// GET /failure - Landing page for a failed login
async fn failure() -> &'static str {
    "Failed to log in!"
}

/// GET /health - Liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
