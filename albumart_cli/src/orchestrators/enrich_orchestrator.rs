//! Enrich command orchestrator
//!
//! Wires configuration into the core batch processor and runs it with the
//! CLI's progress rendering.

use crate::config::AppConfig;
use crate::error::{CliError, CliResult, ErrorContext};
use crate::progress::{create_progress_infrastructure, render_progress};
use albumart_core::error::IoError;
use albumart_core::{
    BatchProcessor, BatchProcessorConfig, BatchSummary, CatalogApi, CatalogClient, RowEnricher,
};
use log::debug;
use std::path::Path;
use std::sync::Arc;

/// Orchestrator for the enrich command
pub struct EnrichOrchestrator {
    processor: BatchProcessor,
}

impl EnrichOrchestrator {
    /// Create an orchestrator talking to the configured catalog
    pub fn from_config(config: &AppConfig) -> CliResult<Self> {
        debug!("Creating enrich orchestrator with {:?}", config.client);

        let catalog = CatalogClient::from_config(&config.client)?;
        Ok(Self::with_catalog(Arc::new(catalog), config))
    }

    /// Create an orchestrator over any catalog implementation
    pub fn with_catalog(catalog: Arc<dyn CatalogApi>, config: &AppConfig) -> Self {
        let enricher = RowEnricher::new(catalog, config.dataset.layout());
        let batch_config = BatchProcessorConfig {
            max_concurrent_rows: config.client.max_concurrent_rows,
            column_label: config.dataset.column_label.clone(),
        };

        Self {
            processor: BatchProcessor::new(Arc::new(enricher), batch_config),
        }
    }

    /// Enrich `input` into `output`, printing one line per row and the tally
    pub async fn run(&self, input: &Path, output: &Path, show_bar: bool) -> CliResult<BatchSummary> {
        if !input.is_file() {
            return Err(CliError::from(albumart_core::Error::from(
                IoError::file_not_found(input),
            )));
        }
        if same_file(input, output) {
            return Err(CliError::misuse("Input and output must be different files")
                .with_context("path", &output.display().to_string()));
        }

        debug!(
            "Enriching {} -> {} with at most {} rows in flight",
            input.display(),
            output.display(),
            self.processor.config().max_concurrent_rows
        );

        let (provider, rx) = create_progress_infrastructure();
        let renderer = tokio::spawn(render_progress(rx, show_bar));

        let result = self
            .processor
            .process_paths(input, output, Arc::clone(&provider))
            .await;

        // Closing the channel lets the renderer drain and exit
        provider.complete();
        drop(provider);
        if let Err(join_err) = renderer.await {
            debug!("Progress renderer ended abnormally: {join_err}");
        }

        Ok(result?)
    }
}

fn same_file(input: &Path, output: &Path) -> bool {
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
