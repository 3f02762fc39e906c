//! Builders for dataset fixtures

pub mod csv_fixture;

pub use csv_fixture::{CsvFixtureBuilder, TrackRow};
