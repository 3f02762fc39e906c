//! Mock implementations for testing

pub mod catalog;

pub use catalog::{MockCatalog, MockResponse};
