use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

use crate::error::{Result, WaporError};

/// Longest token lifetime accepted from the IAM endpoints (one year)
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 3600;

/// Access/refresh token pair issued by the IAM endpoints
#[derive(Clone)]
pub struct Token {
    pub api_key: String,
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_in: i64,
}

impl Token {
    /// Build a token from a sign-in or refresh grant received at `issued_at`.
    ///
    /// `expiresIn` must lie in `1..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn from_grant(api_key: impl Into<String>, grant: TokenGrant, issued_at: DateTime<Utc>) -> Result<Self> {
        if !(1..=MAX_TOKEN_LIFETIME_SECS).contains(&grant.expires_in) {
            return Err(WaporError::InvalidInput {
                field: "expiresIn".to_string(),
                reason: format!(
                    "token lifetime must be between 1 and {} seconds, got {}",
                    MAX_TOKEN_LIFETIME_SECS, grant.expires_in
                ),
            });
        }
        Ok(Self {
            api_key: api_key.into(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            issued_at,
            expires_in: grant.expires_in,
        })
    }

    /// Lifetime as a duration; `None` when `expires_in` is out of range
    pub fn lifetime(&self) -> Option<Duration> {
        Duration::try_seconds(self.expires_in)
    }

    /// Expiry instant, saturating at the latest representable time
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.lifetime()
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True once the token is older than its lifetime minus `margin`.
    /// A lifetime that cannot be represented always asks for a refresh.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let age = now.signed_duration_since(self.issued_at);
        match self.lifetime().and_then(|lifetime| lifetime.checked_sub(&margin)) {
            Some(usable) => age > usable,
            None => true,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("api_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Payload of `iam/sign-in` and `iam/token`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}
