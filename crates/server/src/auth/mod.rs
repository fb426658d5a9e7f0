// Authentication module
// Decision: Stateless cookie sessions; the trust decision is made from
// the signed cookie alone, never from server-side lookups

pub mod cookies;
pub mod middleware;
pub mod oauth;
pub mod routes;

pub use middleware::{resolve_session, AuthUser};
pub use oauth::GoogleOAuthService;
pub use routes::routes;
