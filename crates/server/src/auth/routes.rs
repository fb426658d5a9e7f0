// Login flow routes: start, provider callback, logout
// Decision: The OAuth state nonce lives in a short-lived cookie; the
// server keeps no per-flow state of its own

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use rand::Rng;
use serde::Deserialize;

use super::cookies::{self, SESSION_COOKIE, STATE_COOKIE};
use crate::AppState;

/// Generate a random state nonce for OAuth (32 hex characters)
fn generate_oauth_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Query parameters Google sends to the callback. `code` is absent when
/// the user denied consent.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(login))
        .route("/auth/google/callback", get(callback))
        .route("/auth/logout", get(logout))
}

/// GET /auth/google - Redirect to Google's authorization endpoint
async fn login(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let nonce = generate_oauth_state();
    let url = state.oauth.authorization_url(&nonce);

    (
        jar.add(cookies::oauth_state(nonce)),
        Redirect::to(&url),
    )
}

/// GET /auth/google/callback - Complete the login
///
/// Validates the CSRF state against the cookie set at login start, then
/// exchanges the grant. Success establishes the session cookie and lands
/// on the home page; any failure lands on the failure page with no
/// session established. The state cookie is consumed either way.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(cookies::removal(STATE_COOKIE));

    match (expected, query.state) {
        (Some(expected), Some(presented)) if expected == presented => {}
        _ => {
            tracing::warn!("OAuth callback with missing or mismatched state");
            return (jar, Redirect::to("/failure"));
        }
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback without an authorization code");
        return (jar, Redirect::to("/failure"));
    };

    let identity = match state.oauth.exchange_code(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("OAuth exchange failed: {e:#}");
            return (jar, Redirect::to("/failure"));
        }
    };

    let token = match state.sessions.encode(&identity) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to encode session token: {e}");
            return (jar, Redirect::to("/failure"));
        }
    };

    tracing::info!(user = %identity.id, "login completed");
    (
        jar.add(cookies::session(token, state.config.session.max_age)),
        Redirect::to("/"),
    )
}

/// GET /auth/logout - Drop the session cookie
///
/// Idempotent: removing an absent cookie is a no-op, the observable end
/// state is the same.
async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(cookies::removal(SESSION_COOKIE)),
        Redirect::to("/"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthConfig;
    use crate::test_support::{state_with_oauth, test_state};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn set_cookies(response: &axum::response::Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    async fn mock_provider(server: &MockServer, sub: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-1",
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": sub,
                "email": "u1@example.com",
                "name": "User One",
            })))
            .mount(server)
            .await;
    }

    fn mock_oauth_config(server: &MockServer) -> OAuthConfig {
        let mut oauth = OAuthConfig::new(
            "client-123".to_string(),
            "secret".to_string(),
            "https://localhost:3000/auth/google/callback".to_string(),
        );
        oauth.token_url = format!("{}/token", server.uri());
        oauth.userinfo_url = format!("{}/userinfo", server.uri());
        oauth
    }

    #[tokio::test]
    async fn test_login_sets_state_cookie_and_redirects_to_provider() {
        let app = crate::router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(location.contains("scope=email"));

        // The nonce in the cookie is the nonce in the redirect
        let cookies = set_cookies(&response);
        let state_cookie = cookies
            .iter()
            .find(|c| c.starts_with("oauth_state="))
            .expect("state cookie set");
        let nonce = state_cookie
            .strip_prefix("oauth_state=")
            .unwrap()
            .split(';')
            .next()
            .unwrap();
        assert!(location.contains(&format!("state={nonce}")));
        assert!(state_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_callback_success_sets_session_and_redirects_home() {
        let server = MockServer::start().await;
        mock_provider(&server, "u1").await;
        let state = state_with_oauth(mock_oauth_config(&server));
        let app = crate::router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/google/callback?code=abc&state=xyz")
                    .header(header::COOKIE, "oauth_state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let cookies = set_cookies(&response);
        let session = cookies
            .iter()
            .find(|c| c.starts_with("session="))
            .expect("session cookie set");
        assert!(session.contains("HttpOnly"));
        assert!(session.contains("Secure"));
        assert!(session.contains("Max-Age=86400"));

        // The cookie decodes back to the provider-issued subject id
        let token = session
            .strip_prefix("session=")
            .unwrap()
            .split(';')
            .next()
            .unwrap();
        let decoded = state.sessions.decode(token).expect("valid session token");
        assert_eq!(decoded.identity.id, "u1");

        // The state cookie was consumed
        assert!(cookies
            .iter()
            .any(|c| c.starts_with("oauth_state=") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_callback_exchange_failure_redirects_to_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
            })))
            .mount(&server)
            .await;
        let app = crate::router(state_with_oauth(mock_oauth_config(&server)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/google/callback?code=bad&state=xyz")
                    .header(header::COOKIE, "oauth_state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/failure");
        assert!(
            !set_cookies(&response)
                .iter()
                .any(|c| c.starts_with("session=")),
            "no session cookie on failed exchange"
        );
    }

    #[tokio::test]
    async fn test_callback_state_mismatch_skips_exchange() {
        let server = MockServer::start().await;
        // The token endpoint must never be called on a state mismatch
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let app = crate::router(state_with_oauth(mock_oauth_config(&server)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/google/callback?code=abc&state=attacker")
                    .header(header::COOKIE, "oauth_state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[header::LOCATION], "/failure");
    }

    #[tokio::test]
    async fn test_callback_without_state_cookie_fails() {
        let app = crate::router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/google/callback?code=abc&state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[header::LOCATION], "/failure");
    }

    #[tokio::test]
    async fn test_callback_denied_consent_fails() {
        // Google redirects back with error=access_denied and no code
        let app = crate::router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/google/callback?error=access_denied&state=xyz")
                    .header(header::COOKIE, "oauth_state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[header::LOCATION], "/failure");
    }

    #[tokio::test]
    async fn test_logout_removes_session_cookie() {
        let state = test_state();
        let token = state
            .sessions
            .encode(&hushd_core::Identity::from_id("u1"))
            .unwrap();
        let app = crate::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/logout")
                    .header(header::COOKIE, format!("session={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("session=") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let app = crate::router(test_state());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/auth/logout")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            // Same observable end state with or without a session
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers()[header::LOCATION], "/");
        }
    }
}
