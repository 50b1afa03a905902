//! Token lifecycle: sign-in with an API key and refresh before expiry

use chrono::Duration;
use serde_json::json;

use crate::endpoints::Endpoints;
use crate::envelope;
use crate::error::{Result, WaporError};
use crate::models::{Token, TokenGrant};
use crate::ports::{ApiRequest, Clock, Transport};

pub const API_KEY_HEADER: &str = "X-GISMGR-API-KEY";

/// Default safety margin subtracted from the token lifetime
pub const DEFAULT_TOKEN_MARGIN_SECS: i64 = 120;

/// Largest accepted refresh margin (one day)
pub const MAX_TOKEN_MARGIN_SECS: i64 = 86_400;

/// The single token held by a client
#[derive(Debug)]
pub struct Session {
    token: Token,
    margin: Duration,
}

impl Session {
    /// Sign in with `api_key`.
    ///
    /// Every failure (empty key, transport, HTTP status, rejected envelope,
    /// unexpected payload) surfaces as `WaporError::Authentication`.
    pub fn initialize<T, C>(
        transport: &T,
        clock: &C,
        endpoints: &Endpoints,
        api_key: &str,
        margin: Duration,
    ) -> Result<Self>
    where
        T: Transport + ?Sized,
        C: Clock + ?Sized,
    {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(WaporError::Authentication {
                reason: "API key is empty".to_string(),
            });
        }

        let url = endpoints.sign_in();
        let request = ApiRequest::post(&url, json!({})).header(API_KEY_HEADER, api_key);
        let token = request_grant(transport, &request)
            .and_then(|grant| Token::from_grant(api_key, grant, clock.now()))
            .map_err(|e| WaporError::Authentication {
                reason: format!("sign-in failed: {}", e),
            })?;
        tracing::info!(expires_at = %token.expires_at(), "signed in to WaPOR");
        Ok(Self { token, margin })
    }

    /// Return a usable access token, refreshing it first when it is within
    /// the safety margin of expiry. No request is made otherwise.
    pub fn ensure_valid<T, C>(&mut self, transport: &T, clock: &C, endpoints: &Endpoints) -> Result<&str>
    where
        T: Transport + ?Sized,
        C: Clock + ?Sized,
    {
        let now = clock.now();
        if self.token.needs_refresh(now, self.margin) {
            let request = ApiRequest::post(
                endpoints.refresh(),
                json!({
                    "grandType": "refresh_token",
                    "refreshToken": self.token.refresh_token,
                }),
            );
            self.token = request_grant(transport, &request)
                .and_then(|grant| Token::from_grant(self.token.api_key.clone(), grant, now))
                .map_err(|e| WaporError::Authentication {
                    reason: format!("token refresh failed: {}", e),
                })?;
            tracing::info!(expires_at = %self.token.expires_at(), "refreshed WaPOR access token");
        }
        Ok(&self.token.access_token)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }
}

fn request_grant<T: Transport + ?Sized>(transport: &T, request: &ApiRequest) -> Result<TokenGrant> {
    envelope::fetch(transport, request)
}
