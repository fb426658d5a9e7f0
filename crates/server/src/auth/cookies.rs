// Cookie construction for the session and the in-flight OAuth state.
// Both are HttpOnly and Secure; the payloads are visible base64, signed
// not encrypted, so nothing secret may go into them beyond the subject id.

use axum_extra::extract::cookie::{Cookie, SameSite};
use std::time::Duration;

pub const SESSION_COOKIE: &str = "session";
pub const STATE_COOKIE: &str = "oauth_state";

/// The state cookie only has to survive the round trip to the provider.
const STATE_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Session cookie carrying a signed token.
///
/// SameSite is Lax so the cookie still rides along on the top-level
/// redirect back from the provider.
pub fn session(token: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age.as_secs() as i64))
        .build()
}

/// Short-lived CSRF state cookie set when the login flow starts and
/// consumed by the callback.
pub fn oauth_state(nonce: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, nonce))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(STATE_MAX_AGE.as_secs() as i64))
        .build()
}

/// Removal stub for `CookieJar::remove`; the name and path must match
/// the original cookie for the browser to drop it.
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}
