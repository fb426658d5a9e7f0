// TLS bootstrap: the server only speaks HTTPS.
//
// A self-signed pair for local development:
// openssl req -x509 -newkey rsa:4096 -nodes -keyout key.pem -out cert.pem -days 365

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load the rustls configuration from the PEM files named in the config.
/// Missing or unreadable files abort startup; serving plaintext is not a
/// fallback.
pub async fn load(config: &TlsConfig) -> Result<RustlsConfig> {
    RustlsConfig::from_pem_file(&config.cert_file, &config.key_file)
        .await
        .with_context(|| {
            format!(
                "Failed to load TLS certificate ({}) and key ({})",
                config.cert_file.display(),
                config.key_file.display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_files_fail() {
        let config = TlsConfig {
            cert_file: "does-not-exist-cert.pem".into(),
            key_file: "does-not-exist-key.pem".into(),
        };

        let err = load(&config).await.unwrap_err();
        assert!(err.to_string().contains("does-not-exist-cert.pem"));
    }
}
