//! Progress rendering for the CLI
//!
//! Row lines go to stdout in input order. The optional progress bar and the
//! final tally go to stderr.

use super::format_duration;
use albumart_core::progress::ProgressUpdate;
use albumart_core::{BatchSummary, LookupOutcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

/// Render progress updates from a channel until every sender is gone
pub async fn render_progress(mut rx: mpsc::UnboundedReceiver<ProgressUpdate>, show_bar: bool) {
    let mut renderer = ProgressRenderer::new(show_bar);

    while let Some(update) = rx.recv().await {
        renderer.handle_update(update);
    }

    renderer.finish();
}

/// Progress renderer that manages console output for a run
pub struct ProgressRenderer {
    show_bar: bool,
    bar: Option<ProgressBar>,
}

impl ProgressRenderer {
    pub fn new(show_bar: bool) -> Self {
        Self {
            show_bar,
            bar: None,
        }
    }

    /// Handle a progress update
    pub fn handle_update(&mut self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::RowsDispatched { total } => self.start_bar(total),

            ProgressUpdate::RowCompleted {
                index,
                track_name,
                artist_name,
                outcome,
            } => {
                let line = row_line(
                    index,
                    track_name.as_deref(),
                    artist_name.as_deref(),
                    &outcome,
                );
                self.print_line(&line);
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
            }

            ProgressUpdate::Summary(summary) => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                eprintln!("{}", summary_line(&summary));
                eprintln!("{}", total_failures_line(&summary));
            }

            ProgressUpdate::Status { message } => {
                eprintln!("{} {}", "→".green(), message);
            }
        }
    }

    fn start_bar(&mut self, total: usize) {
        if !self.show_bar || total == 0 {
            return;
        }

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows | ETA: {eta}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        self.bar = Some(bar);
    }

    fn print_line(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Finish any progress bar still on screen
    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Console line for one completed row: the URL, "not found", or the error
pub fn row_line(
    index: usize,
    track_name: Option<&str>,
    artist_name: Option<&str>,
    outcome: &LookupOutcome,
) -> String {
    let subject = format!(
        "{} - {}",
        track_name.unwrap_or("?"),
        artist_name.unwrap_or("?")
    );
    let detail = match outcome {
        LookupOutcome::Found(url) => url.cyan().to_string(),
        LookupOutcome::NotFound => "not found".yellow().to_string(),
        LookupOutcome::Failed(reason) => format!("Error: {reason}").red().to_string(),
    };
    format!("[{}] {}: {}", index + 1, subject, detail)
}

/// One-line breakdown of a finished run
pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "Processed {} rows in {}: {} found, {} not found, {} failed",
        summary.rows,
        format_duration(summary.total_time.as_secs()),
        summary.found,
        summary.not_found,
        summary.failed
    )
}

/// The failure tally printed at the end of every run
pub fn total_failures_line(summary: &BatchSummary) -> String {
    format!("Total failures: {}", summary.failed)
}
