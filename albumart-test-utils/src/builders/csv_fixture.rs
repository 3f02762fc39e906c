//! Builder for music dataset CSV fixtures

use std::io::Write;
use std::path::{Path, PathBuf};

/// One data row of a music dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub id: String,
    pub artist: String,
    pub album: String,
    pub track: String,
    pub genre: String,
}

impl TrackRow {
    pub fn new(id: &str, artist: &str, album: &str, track: &str) -> Self {
        Self {
            id: id.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            track: track.to_string(),
            genre: "rock".to_string(),
        }
    }

    /// Fields in dataset order: id, artist, album, track, genre
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.artist.clone(),
            self.album.clone(),
            self.track.clone(),
            self.genre.clone(),
        ]
    }
}

/// Builder for dataset CSV text
///
/// The default header is `id,artist_name,album_name,track_name,genre`, which
/// puts the artist at column 1 and the track at column 3.
pub struct CsvFixtureBuilder {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Default for CsvFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFixtureBuilder {
    pub fn new() -> Self {
        Self {
            header: ["id", "artist_name", "album_name", "track_name", "genre"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_header(mut self, header: &[&str]) -> Self {
        self.header = header.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_track(mut self, row: TrackRow) -> Self {
        self.rows.push(row.fields());
        self
    }

    /// Add a raw row, which may be shorter or longer than the header
    pub fn with_raw_row(mut self, fields: &[&str]) -> Self {
        self.rows.push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Add `count` rows with distinct ids, artists and tracks
    pub fn with_generated_tracks(mut self, count: usize) -> Self {
        for i in 0..count {
            let row = TrackRow::new(
                &i.to_string(),
                &format!("Artist {i}"),
                &format!("Album {i}"),
                &format!("Track {i}"),
            );
            self.rows.push(row.fields());
        }
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render the fixture as CSV text, quoting fields that need it
    pub fn build(&self) -> String {
        let mut out = String::new();
        for record in std::iter::once(&self.header).chain(self.rows.iter()) {
            let line: Vec<String> = record.iter().map(|field| quote(field)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the fixture into `dir` and return the file path
    pub fn write_to(&self, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(self.build().as_bytes())?;
        Ok(path)
    }
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
