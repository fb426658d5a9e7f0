// Google OAuth2 client
// Decision: Manual OAuth2 implementation to avoid http crate version conflicts
// Decision: The grant exchange is the only outbound call the server makes;
// bound it with a client timeout and classify every failure the same way

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::OAuthConfig;
use hushd_core::Identity;

/// Timeout for the token and userinfo calls. Expiry is treated as a failed
/// exchange like any other provider error.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Google OAuth service: builds the authorization redirect and exchanges
/// authorization codes for a verified identity.
pub struct GoogleOAuthService {
    config: OAuthConfig,
    auth_endpoint: Url,
    client: reqwest::Client,
}

impl GoogleOAuthService {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let auth_endpoint =
            Url::parse(&config.auth_url).context("Invalid authorization endpoint URL")?;
        let client = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            config,
            auth_endpoint,
            client,
        })
    }

    /// Authorization endpoint URL for the login redirect.
    ///
    /// `state` is the per-flow CSRF nonce; the callback must present it
    /// back alongside the matching state cookie.
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_endpoint.clone();

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", "email")
            .append_pair("state", state);

        url.into()
    }

    /// Exchange an authorization code for the user's identity.
    ///
    /// Two provider calls: code for access token, then the userinfo
    /// endpoint with the bearer token. Any failure along the way (denied
    /// consent, invalid grant, network error, timeout) surfaces as an
    /// error; the caller redirects to the failure page.
    pub async fn exchange_code(&self, code: &str) -> Result<Identity> {
        let token_response: TokenResponse = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .error_for_status()
            .context("Token endpoint rejected the grant")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let user_info: UserInfo = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token_response.access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .error_for_status()
            .context("Userinfo endpoint rejected the token")?
            .json()
            .await
            .context("Failed to parse user info")?;

        if user_info.sub.is_empty() {
            anyhow::bail!("Provider returned an empty subject id");
        }

        Ok(Identity {
            id: user_info.sub,
            email: user_info.email,
            name: user_info.name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}
