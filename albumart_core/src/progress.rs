//! Progress reporting abstractions for the album art enricher
//!
//! The batch processor reports through this trait so the core library never
//! depends on how (or whether) a front end renders progress.

use crate::batch_processor::BatchSummary;
use crate::enrichment::LookupOutcome;
use std::sync::{Arc, Mutex};

/// Core trait for progress reporting
pub trait ProgressProvider: Send + Sync {
    /// Report a progress update
    fn report(&self, update: ProgressUpdate);

    /// Signal that the operation is complete
    fn complete(&self);
}

/// Progress update emitted while a dataset is processed
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// Rows have been read and dispatched; `total` is known from here on
    RowsDispatched { total: usize },

    /// A row was written to the output, in input order
    RowCompleted {
        /// Zero-based data row index (header excluded)
        index: usize,
        track_name: Option<String>,
        artist_name: Option<String>,
        outcome: LookupOutcome,
    },

    /// Final tally for the run
    Summary(BatchSummary),

    /// Generic status message
    Status { message: String },
}

/// Null implementation for when no progress is needed
pub struct NullProvider;

impl ProgressProvider for NullProvider {
    fn report(&self, _update: ProgressUpdate) {}

    fn complete(&self) {}
}

/// Provider that keeps every update, for inspection after a run
#[derive(Default, Clone)]
pub struct RecordingProvider {
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
    completed: Arc<Mutex<bool>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the updates received so far
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.lock().map(|flag| *flag).unwrap_or(false)
    }
}

impl ProgressProvider for RecordingProvider {
    fn report(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }

    fn complete(&self) {
        if let Ok(mut flag) = self.completed.lock() {
            *flag = true;
        }
    }
}

/// Helper functions for creating providers
impl dyn ProgressProvider {
    /// Create a null provider (useful for tests and when progress isn't needed)
    pub fn null() -> Arc<dyn ProgressProvider> {
        Arc::new(NullProvider)
    }
}
