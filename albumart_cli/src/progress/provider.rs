//! Progress provider implementation for CLI
//!
//! Bridges the core library's progress reporting with the renderer task.

use albumart_core::progress::{ProgressProvider, ProgressUpdate};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Channel-based progress provider for CLI rendering
///
/// The channel is unbounded: every completed row carries a console line, and
/// dropping one would lose output.
pub struct ChannelProvider {
    tx: Mutex<Option<mpsc::UnboundedSender<ProgressUpdate>>>,
}

impl ChannelProvider {
    pub fn new(tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl ProgressProvider for ChannelProvider {
    fn report(&self, update: ProgressUpdate) {
        let tx_opt = self.tx.lock().ok().and_then(|guard| guard.clone());
        if let Some(tx) = tx_opt {
            // Receiver gone means the renderer already finished
            let _ = tx.send(update);
        }
    }

    fn complete(&self) {
        // Drop our sender so the renderer can exit its loop
        if let Ok(mut guard) = self.tx.lock() {
            *guard = None;
        }
    }
}

/// Create a progress provider and renderer channel pair
pub fn create_progress_infrastructure()
-> (Arc<dyn ProgressProvider>, mpsc::UnboundedReceiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let provider = Arc::new(ChannelProvider::new(tx)) as Arc<dyn ProgressProvider>;
    (provider, rx)
}
