//! Test utilities for the album art enricher
//!
//! This crate provides a scriptable catalog mock and builders for dataset
//! fixtures, so batch and CLI behavior can be tested without network access.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::{CsvFixtureBuilder, TrackRow};
pub use mocks::{MockCatalog, MockResponse};
