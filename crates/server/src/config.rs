// Server configuration loaded from environment variables.
// Decision: Build one immutable Config at startup and thread it through
// axum state; required variables abort startup instead of serving broken

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Google OAuth endpoints and credentials.
///
/// Endpoint URLs default to Google's; tests swap them for a local mock.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the provider
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl OAuthConfig {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }
}

/// TLS certificate material, read from PEM files at startup.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// Session cookie signing configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Signing keys, current first. Two keys keep rotation seamless:
    /// old cookies verify against the second while new ones are signed
    /// with the first.
    pub keys: Vec<String>,
    pub max_age: Duration,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub public_dir: PathBuf,
    pub tls: TlsConfig,
    pub oauth: OAuthConfig,
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `CLIENT_ID`, `CLIENT_SECRET`, `COOKIE_KEY_1` and `COOKIE_KEY_2` are
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let client_id =
            std::env::var("CLIENT_ID").context("CLIENT_ID environment variable required")?;
        let client_secret = std::env::var("CLIENT_SECRET")
            .context("CLIENT_SECRET environment variable required")?;

        let key_1 =
            std::env::var("COOKIE_KEY_1").context("COOKIE_KEY_1 environment variable required")?;
        let key_2 =
            std::env::var("COOKIE_KEY_2").context("COOKIE_KEY_2 environment variable required")?;

        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("https://localhost:{}", bind_addr.port()));
        let redirect_url = std::env::var("OAUTH_REDIRECT_URL")
            .unwrap_or_else(|_| format!("{}/auth/google/callback", base_url));

        let tls = TlsConfig {
            cert_file: std::env::var("TLS_CERT_FILE")
                .unwrap_or_else(|_| "cert.pem".to_string())
                .into(),
            key_file: std::env::var("TLS_KEY_FILE")
                .unwrap_or_else(|_| "key.pem".to_string())
                .into(),
        };

        let public_dir: PathBuf = std::env::var("PUBLIC_DIR")
            .unwrap_or_else(|_| "public".to_string())
            .into();

        Ok(Self {
            bind_addr,
            public_dir,
            tls,
            oauth: OAuthConfig::new(client_id, client_secret, redirect_url),
            session: SessionConfig {
                keys: vec![key_1, key_2],
                max_age: Duration::from_secs(24 * 60 * 60),
            },
        })
    }
}
