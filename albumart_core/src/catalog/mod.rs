//! Remote music catalog access
//!
//! The [`CatalogApi`] trait is what the row enricher talks to. [`CatalogClient`]
//! implements it over HTTP using the OAuth client-credentials grant and the
//! catalog's track search endpoint.

pub mod client;
pub mod messages;

pub use client::CatalogClient;
pub use messages::{SearchResponse, TokenResponse, search_query};

use crate::Result;
use async_trait::async_trait;

/// Token endpoint of the catalog's accounts service
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Search endpoint of the catalog API
pub const DEFAULT_SEARCH_URL: &str = "https://api.spotify.com/v1/search";

pub const USER_AGENT: &str = concat!("albumart/", env!("CARGO_PKG_VERSION"));

/// Authentication and track lookup against a music catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Return the bearer token, fetching it on first use
    ///
    /// Fails with [`CatalogError::Auth`](crate::error::CatalogError::Auth) when
    /// the token response carries no access token.
    async fn obtain_token(&self) -> Result<String>;

    /// Resolve a track and artist to the first album image URL
    ///
    /// Returns `Ok(None)` when the catalog answered but had no matching track
    /// or no image, and an error when the search request itself failed.
    async fn search_track(&self, track_name: &str, artist_name: &str) -> Result<Option<String>>;
}
