//! Command orchestrators for business logic
//!
//! Orchestrators coordinate between the CLI layer and the core library.

pub mod enrich_orchestrator;

pub use enrich_orchestrator::EnrichOrchestrator;
