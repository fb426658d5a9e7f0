// User identity as asserted by the OAuth provider

use serde::{Deserialize, Serialize};

/// Identity established by the external provider.
///
/// The `id` is Google's `sub` claim: opaque, stable per account. Profile
/// attributes are transient display data from the userinfo endpoint; only
/// the id goes into the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued subject id
    pub id: String,
    /// User email, if the `email` scope was granted
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
}

impl Identity {
    /// Identity carrying only the subject id, as reconstructed from a
    /// session cookie.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
        }
    }
}
