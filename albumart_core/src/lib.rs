//! Album Art Core Library
//!
//! Resolves track/artist pairs in a music dataset to album cover image URLs
//! through a remote catalog, and writes the dataset back out with the URL
//! appended to every row.

pub mod batch_processor;
pub mod catalog;
pub mod enrichment;
pub mod error;
pub mod progress;
pub mod security;

pub use batch_processor::{BatchProcessor, BatchProcessorConfig, BatchSummary};
pub use catalog::{CatalogApi, CatalogClient};
pub use enrichment::{EnrichedRow, LookupOutcome, RowEnricher, RowLayout};
pub use error::{Error, Result};
pub use progress::{NullProvider, ProgressProvider, ProgressUpdate};
pub use security::{ClientCredentials, SecureString};

use error::ValidationError;
use std::fmt;
use std::time::Duration;

/// Label of the column appended to the dataset header
pub const DEFAULT_COLUMN_LABEL: &str = "Cover_image_url";

/// Default upper bound on simultaneously in-flight row lookups
pub const DEFAULT_MAX_CONCURRENT_ROWS: usize = 20;

/// Catalog client configuration
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub search_url: String,
    pub request_timeout_seconds: u64,
    pub max_concurrent_rows: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: catalog::DEFAULT_TOKEN_URL.to_string(),
            search_url: catalog::DEFAULT_SEARCH_URL.to_string(),
            request_timeout_seconds: 30,
            max_concurrent_rows: DEFAULT_MAX_CONCURRENT_ROWS,
        }
    }
}

impl ClientConfig {
    /// Create a test configuration pointing at a local catalog
    pub fn test(base_url: &str) -> Self {
        Self {
            client_id: Some("testclient".to_string()),
            client_secret: Some("testsecret".to_string()),
            token_url: format!("{base_url}/api/token"),
            search_url: format!("{base_url}/v1/search"),
            request_timeout_seconds: 5,
            max_concurrent_rows: 4,
        }
    }

    /// Build credentials from the configured id and secret
    pub fn credentials(&self) -> Result<ClientCredentials> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| ValidationError::missing_field("client_id"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| ValidationError::missing_field("client_secret"))?;

        ClientCredentials::new(client_id, client_secret)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Check values that would make a run impossible
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_rows == 0 {
            return Err(ValidationError::invalid_parameter(
                "max_concurrent_rows",
                "must be greater than 0",
            )
            .into());
        }
        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::invalid_parameter(
                "request_timeout_seconds",
                "must be greater than 0",
            )
            .into());
        }
        for (name, url) in [("token_url", &self.token_url), ("search_url", &self.search_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ValidationError::invalid_configuration(&format!(
                    "{name} must be an http(s) URL, got '{url}'"
                ))
                .into());
            }
        }
        Ok(())
    }
}

// The secret must never reach a log line through `{:?}`
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "***"),
            )
            .field("token_url", &self.token_url)
            .field("search_url", &self.search_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_concurrent_rows", &self.max_concurrent_rows)
            .finish()
    }
}

/// Dataset layout configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub artist_column: usize,
    pub track_column: usize,
    pub column_label: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let layout = RowLayout::default();
        Self {
            artist_column: layout.artist_column,
            track_column: layout.track_column,
            column_label: DEFAULT_COLUMN_LABEL.to_string(),
        }
    }
}

impl DatasetConfig {
    pub fn layout(&self) -> RowLayout {
        RowLayout {
            artist_column: self.artist_column,
            track_column: self.track_column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_concurrent_rows, 20);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.token_url.starts_with("https://accounts.spotify.com"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let config = ClientConfig::default();
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("client_id"));

        let config = ClientConfig {
            client_id: Some("id".to_string()),
            ..Default::default()
        };
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ClientConfig {
            max_concurrent_rows: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_url_rejected() {
        let config = ClientConfig {
            search_url: "ftp://example.com/search".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("search_url"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = ClientConfig::test("http://127.0.0.1:1");
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("testclient"));
        assert!(!debug_str.contains("testsecret"));
    }

    #[test]
    fn test_dataset_defaults() {
        let dataset = DatasetConfig::default();
        assert_eq!(dataset.artist_column, 1);
        assert_eq!(dataset.track_column, 3);
        assert_eq!(dataset.column_label, "Cover_image_url");
    }
}
