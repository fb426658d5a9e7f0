// hushd: HTTPS server with a Google-login gate in front of one secret
// Decision: One AppState holds the immutable config, the session codec and
// the OAuth client; no globals anywhere

mod auth;
mod config;
mod routes;
mod tls;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use hushd_core::{SessionCodec, SigningKeys};

/// App state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionCodec,
    pub oauth: Arc<auth::GoogleOAuthService>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let keys = SigningKeys::new(config.session.keys.clone())
            .context("Session signing keys missing")?;
        let oauth = auth::GoogleOAuthService::new(config.oauth.clone())
            .context("Failed to build OAuth client")?;

        Ok(Self {
            config: Arc::new(config),
            sessions: SessionCodec::new(keys),
            oauth: Arc::new(oauth),
        })
    }
}

/// Build the full router: pages and auth routes behind the session
/// resolver, which runs once per request before dispatch.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes(&state))
        .merge(auth::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hushd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("hushd starting...");

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        bind = %config.bind_addr,
        redirect = %config.oauth.redirect_url,
        "Configuration loaded"
    );

    let tls_config = tls::load(&config.tls).await?;
    tracing::info!(
        cert = %config.tls.cert_file.display(),
        "TLS certificate loaded"
    );

    let addr = config.bind_addr;
    let state = AppState::new(config)?;
    let app = router(state);

    tracing::info!("HTTPS server listening on {}", addr);
    axum_server::bind_rustls(addr, tls_config)
        .serve(app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod test_support {
    use super::*;
    use crate::config::{OAuthConfig, SessionConfig, TlsConfig};
    use std::time::Duration;

    /// State with throwaway keys and the default (Google) OAuth endpoints.
    pub fn test_state() -> AppState {
        state_with_keys(&["key-1", "key-2"])
    }

    pub fn state_with_keys(keys: &[&str]) -> AppState {
        build(keys, default_oauth())
    }

    pub fn state_with_oauth(oauth: OAuthConfig) -> AppState {
        build(&["key-1", "key-2"], oauth)
    }

    fn default_oauth() -> OAuthConfig {
        OAuthConfig::new(
            "client-123".to_string(),
            "secret".to_string(),
            "https://localhost:3000/auth/google/callback".to_string(),
        )
    }

    fn build(keys: &[&str], oauth: OAuthConfig) -> AppState {
        AppState::new(Config {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            public_dir: "public".into(),
            tls: TlsConfig {
                cert_file: "cert.pem".into(),
                key_file: "key.pem".into(),
            },
            oauth,
            session: SessionConfig {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                max_age: Duration::from_secs(24 * 60 * 60),
            },
        })
        .unwrap()
    }
}
