//! Per-row enrichment
//!
//! A row is resolved by searching the catalog for its track and artist. A
//! search that succeeds without an image is retried exactly once; a search
//! that errors is not retried and marks the row as failed.

use crate::catalog::CatalogApi;
use crate::error::ValidationError;
use log::{debug, info, warn};
use std::sync::Arc;

/// Positions of the artist and track fields within a data row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub artist_column: usize,
    pub track_column: usize,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            artist_column: 1,
            track_column: 3,
        }
    }
}

impl RowLayout {
    /// Extract `(track, artist)` from a row
    pub fn extract<'a>(&self, row: &'a [String]) -> Result<(&'a str, &'a str), ValidationError> {
        let track = row.get(self.track_column).ok_or_else(|| {
            ValidationError::missing_column("track", self.track_column, row.len())
        })?;
        let artist = row.get(self.artist_column).ok_or_else(|| {
            ValidationError::missing_column("artist", self.artist_column, row.len())
        })?;
        Ok((track.as_str(), artist.as_str()))
    }
}

/// Result of resolving one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Cover image URL found
    Found(String),
    /// The catalog answered twice without an image; not a failure
    NotFound,
    /// The lookup errored; the reason is kept for diagnostics
    Failed(String),
}

impl LookupOutcome {
    /// Value written to the appended column
    pub fn as_field(&self) -> &str {
        match self {
            LookupOutcome::Found(url) => url,
            LookupOutcome::NotFound | LookupOutcome::Failed(_) => "",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LookupOutcome::Failed(_))
    }
}

/// A data row with the cover field appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRow {
    /// Original fields followed by the cover image URL (or empty string)
    pub fields: Vec<String>,
    pub outcome: LookupOutcome,
}

impl EnrichedRow {
    pub fn new(mut row: Vec<String>, outcome: LookupOutcome) -> Self {
        row.push(outcome.as_field().to_string());
        Self {
            fields: row,
            outcome,
        }
    }

    /// Row that could not be resolved at all
    pub fn failed(row: Vec<String>, reason: impl Into<String>) -> Self {
        Self::new(row, LookupOutcome::Failed(reason.into()))
    }
}

/// Resolves rows against a shared catalog
pub struct RowEnricher {
    catalog: Arc<dyn CatalogApi>,
    layout: RowLayout,
}

impl RowEnricher {
    pub fn new(catalog: Arc<dyn CatalogApi>, layout: RowLayout) -> Self {
        Self { catalog, layout }
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    /// Look up the cover for a track, retrying once on "no image"
    pub async fn lookup(&self, track_name: &str, artist_name: &str) -> LookupOutcome {
        let mut outcome = self.search_once(track_name, artist_name).await;
        if outcome == LookupOutcome::NotFound {
            outcome = self.search_once(track_name, artist_name).await;
        }

        match &outcome {
            LookupOutcome::Found(url) => {
                info!("Found cover for '{track_name}' by '{artist_name}': {url}");
            }
            LookupOutcome::NotFound => {
                info!("No cover for '{track_name}' by '{artist_name}'");
            }
            LookupOutcome::Failed(reason) => {
                warn!("Lookup failed for '{track_name}' by '{artist_name}': {reason}");
            }
        }
        outcome
    }

    /// Enrich one data row
    pub async fn enrich(&self, row: Vec<String>) -> EnrichedRow {
        let outcome = match self.layout.extract(&row) {
            Ok((track_name, artist_name)) => self.lookup(track_name, artist_name).await,
            Err(err) => {
                warn!("Skipping row: {err}");
                LookupOutcome::Failed(err.to_string())
            }
        };
        EnrichedRow::new(row, outcome)
    }

    async fn search_once(&self, track_name: &str, artist_name: &str) -> LookupOutcome {
        match self.catalog.search_track(track_name, artist_name).await {
            Ok(Some(url)) => LookupOutcome::Found(url),
            Ok(None) => LookupOutcome::NotFound,
            Err(err) => {
                if let crate::Error::Catalog(catalog_err) = &err
                    && catalog_err.is_transient()
                {
                    debug!("Transient catalog error for '{track_name}' by '{artist_name}'");
                }
                LookupOutcome::Failed(err.to_string())
            }
        }
    }
}
