//! Wire types for the catalog token and search endpoints
//!
//! Every level of the search response is optional: a well-formed response
//! with a missing level means "no image", not an error.

use serde::{Deserialize, Serialize};

/// Token endpoint response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    /// Seconds until expiry, reported by the server
    pub expires_in: Option<u64>,
}

/// Search endpoint response (`type=track`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    pub tracks: Option<TrackPage>,
}

/// One page of track results
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackPage {
    pub items: Option<Vec<Track>>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Track {
    pub name: Option<String>,
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Album {
    pub name: Option<String>,
    pub images: Option<Vec<Image>>,
}

/// Album artwork, largest first
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Image {
    pub url: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

impl SearchResponse {
    /// `tracks.items[0].album.images[0].url`
    pub fn first_image_url(&self) -> Option<&str> {
        self.tracks
            .as_ref()?
            .items
            .as_ref()?
            .first()?
            .album
            .as_ref()?
            .images
            .as_ref()?
            .first()?
            .url
            .as_deref()
    }
}

/// Build the search query for a track by an artist
pub fn search_query(track_name: &str, artist_name: &str) -> String {
    format!("track:{track_name} artist:{artist_name}")
}
