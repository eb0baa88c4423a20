// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::{AvisError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;

pub const TOKEN_URL: &str = "https://api.lufthansa.com/v1/oauth/token";

/// Something that can hand out a bearer token for the schedule API.
pub trait CredentialProvider {
    fn token(&mut self) -> Result<String>;
}

/// A token issued out of band. Never expires from our point of view.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn token(&mut self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && self.expires_at >= now
    }
}

/// OAuth2 client-credentials provider with a cached token.
pub struct OAuthTokenProvider {
    client_id: String,
    client_secret: String,
    token_url: String,
    http: reqwest::blocking::Client,
    cached: Option<CachedToken>,
}

impl OAuthTokenProvider {
    pub fn new(client_id: &str, client_secret: &str, token_url: &str) -> Result<Self> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AvisError::Auth(
                "client id and client secret are required".to_string(),
            ));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url: token_url.to_string(),
            http,
            cached: None,
        })
    }

    fn store(&mut self, response: TokenResponse, now: DateTime<Utc>) -> String {
        let expires_at = now + ChronoDuration::seconds(response.expires_in);
        debug!("Cached access token; expires_at={}", expires_at);
        self.cached = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at,
        });
        response.access_token
    }

    fn request_token(&self) -> Result<TokenResponse> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];
        let response = self.http.post(&self.token_url).form(&form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AvisError::Auth(format!(
                "token endpoint answered with status {}",
                status
            )));
        }
        Ok(response.json::<TokenResponse>()?)
    }
}

impl CredentialProvider for OAuthTokenProvider {
    fn token(&mut self) -> Result<String> {
        let now = Utc::now();
        if let Some(cached) = self.cached.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(cached.value.clone());
        }

        info!("Requesting new access token; url={}", self.token_url);
        let response = self.request_token()?;
        Ok(self.store(response, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OAuthTokenProvider {
        OAuthTokenProvider::new("id", "secret", TOKEN_URL).unwrap()
    }

    fn needs_refresh(p: &OAuthTokenProvider, now: DateTime<Utc>) -> bool {
        !p.cached.as_ref().is_some_and(|t| t.is_valid_at(now))
    }

    #[test]
    fn test_refresh_needed_without_token() {
        assert!(needs_refresh(&provider(), Utc::now()));
    }

    #[test]
    fn test_cached_token_reused_until_expiry() {
        let mut p = provider();
        let now = Utc::now();
        let token = p.store(
            TokenResponse {
                access_token: "abc".to_string(),
                expires_in: 3600,
            },
            now,
        );
        assert_eq!(token, "abc");
        assert!(!needs_refresh(&p, now));
        assert!(!needs_refresh(&p, now + ChronoDuration::seconds(3600)));
        assert!(needs_refresh(&p, now + ChronoDuration::seconds(3601)));

        // Served from cache, no network round trip.
        assert_eq!(p.token().unwrap(), "abc");
    }

    #[test]
    fn test_empty_access_token_is_not_cached() {
        let mut p = provider();
        let now = Utc::now();
        p.store(
            TokenResponse {
                access_token: String::new(),
                expires_in: 3600,
            },
            now,
        );
        assert!(needs_refresh(&p, now));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = OAuthTokenProvider::new("", "secret", TOKEN_URL);
        assert!(matches!(err, Err(AvisError::Auth(_))));
    }

    #[test]
    fn test_static_token() {
        let mut t = StaticToken("fixed".to_string());
        assert_eq!(t.token().unwrap(), "fixed");
    }

    #[test]
    fn test_token_response_shape() {
        let r: TokenResponse = serde_json::from_str(
            r#"{"access_token":"xyz","token_type":"bearer","expires_in":129600}"#,
        )
        .unwrap();
        assert_eq!(r.access_token, "xyz");
        assert_eq!(r.expires_in, 129600);
    }
}
