// Signed session cookie codec
// Decision: Sign with the first key, verify against every key in order;
// rotation keeps old cookies valid while new ones pick up the current key
// Decision: Decode failure is Option::None, not an error; an absent or
// stale session is a normal request state

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::identity::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while producing a session token
#[derive(Debug, Error)]
pub enum SessionError {
    /// No signing keys were configured
    #[error("signing key set is empty")]
    NoKeys,

    /// Payload serialization error
    #[error("failed to serialize session payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ordered signing key set, current key first.
///
/// Rotation contract: prepend the new key and keep the previous one in the
/// list. Cookies signed under the old key still verify and get re-signed
/// with the new key on their next request.
#[derive(Clone)]
pub struct SigningKeys {
    keys: Vec<String>,
}

impl SigningKeys {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(SessionError::NoKeys);
        }
        Ok(Self { keys })
    }

    fn current(&self) -> &str {
        &self.keys[0]
    }
}

impl std::fmt::Debug for SigningKeys {
    // Key material stays out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("count", &self.keys.len())
            .finish()
    }
}

/// What the session cookie actually carries: the subject id, nothing else.
/// Profile data stays out of the cookie to bound its size.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    id: String,
}

/// A verified session, plus whether it was signed with the current key.
#[derive(Debug)]
pub struct DecodedSession {
    pub identity: Identity,
    /// False when the token verified under a rotated (non-primary) key;
    /// the resolver re-signs it on the way out.
    pub current_key: bool,
}

/// Encodes identities into signed tokens and back.
///
/// Token format: `base64url(payload) + "." + base64url(hmac_sha256(payload))`.
/// The payload is visible to the client (signed, not encrypted).
#[derive(Clone, Debug)]
pub struct SessionCodec {
    keys: SigningKeys,
}

impl SessionCodec {
    pub fn new(keys: SigningKeys) -> Self {
        Self { keys }
    }

    /// Serialize an identity's subject id into a signed token.
    pub fn encode(&self, identity: &Identity) -> Result<String> {
        let payload = serde_json::to_vec(&SessionClaims {
            id: identity.id.clone(),
        })?;
        Ok(sign(&payload, self.keys.current()))
    }

    /// Verify a token and recover the identity reference.
    ///
    /// Returns `None` for malformed tokens, signature mismatches under
    /// every configured key, and payloads without a non-empty id. The
    /// signature is checked before the payload is even parsed.
    pub fn decode(&self, token: &str) -> Option<DecodedSession> {
        let (payload_b64, signature_b64) = token.split_once('.')?;
        // A second dot means this is not our two-segment format
        if signature_b64.contains('.') {
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let matched = self.keys.keys.iter().position(|key| {
            let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                .expect("HMAC accepts keys of any length");
            mac.update(&payload);
            mac.verify_slice(&signature).is_ok()
        })?;

        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        if claims.id.is_empty() {
            return None;
        }

        Some(DecodedSession {
            identity: Identity::from_id(claims.id),
            current_key: matched == 0,
        })
    }
}

fn sign(payload: &[u8], key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    let signature = mac.finalize().into_bytes();

    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(signature)
    )
}
