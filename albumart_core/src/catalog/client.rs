//! HTTP catalog client
//!
//! One client is shared by every row task. The bearer token is fetched once
//! under a mutex, so concurrent first callers wait for a single exchange
//! instead of each hitting the token endpoint.

use super::messages::{SearchResponse, TokenResponse, search_query};
use super::{CatalogApi, USER_AGENT};
use crate::error::{CatalogError, Result};
use crate::security::ClientCredentials;
use crate::ClientConfig;
use async_trait::async_trait;
use log::{debug, trace, warn};
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use tokio::sync::Mutex;

/// Catalog client speaking the client-credentials grant and track search
pub struct CatalogClient {
    http_client: reqwest::Client,
    credentials: ClientCredentials,
    token_url: String,
    search_url: String,
    /// Cached bearer token; never refreshed during a run
    token: Mutex<Option<String>>,
}

impl CatalogClient {
    /// Create a client against the given endpoints
    pub fn new(
        credentials: ClientCredentials,
        token_url: impl Into<String>,
        search_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            credentials,
            token_url: token_url.into(),
            search_url: search_url.into(),
            token: Mutex::new(None),
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.credentials()?,
            config.token_url.clone(),
            config.search_url.clone(),
            config.request_timeout(),
        )
    }

    async fn request_token(&self) -> Result<String> {
        debug!(
            "Requesting access token for client {} from {}",
            self.credentials.client_id(),
            self.token_url
        );

        let response = self
            .http_client
            .post(&self.token_url)
            .header(AUTHORIZATION, self.credentials.basic_authorization())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::auth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("Token endpoint returned {status}");
            return Err(CatalogError::auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            ))
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CatalogError::auth(format!("token response is not valid JSON: {e}")))?;

        if let Some(expires_in) = token.expires_in {
            debug!("Access token issued, expires in {expires_in}s");
        }

        token
            .access_token
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CatalogError::auth("token response has no access_token").into())
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn obtain_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn search_track(&self, track_name: &str, artist_name: &str) -> Result<Option<String>> {
        let token = self.obtain_token().await?;
        let query = search_query(track_name, artist_name);
        trace!("Searching catalog: {query}");

        let response = self
            .http_client
            .get(&self.search_url)
            .bearer_auth(&token)
            .query(&[("q", query.as_str()), ("type", "track")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::search(status.as_u16(), body).into());
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| CatalogError::malformed(format!("search response: {e}")))?;

        Ok(parsed.first_image_url().map(str::to_string))
    }
}
