//! Bearer-token claims model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by a verified bearer token.
///
/// `sub` is the identity-provider account UID, which doubles as the document
/// ID of the caller's profile. Roles are deliberately *not* in the token:
/// they are looked up from the stored profile on every request, so a role
/// change takes effect without re-issuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject: identity-provider account UID.
    pub sub: String,

    /// Account email, if the provider knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl AuthClaims {
    /// Build claims for a freshly issued token.
    pub fn new(uid: impl Into<String>, email: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: uid.into(),
            email,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
