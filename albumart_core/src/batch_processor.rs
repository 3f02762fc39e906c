//! Bounded-concurrency dataset processing
//!
//! Every data row becomes one task. A semaphore caps how many tasks are
//! resolving at once, and a single drain loop awaits the tasks in submission
//! order, so output rows always follow input rows no matter which lookup
//! finishes first. The drain loop is the only writer of the output.

use crate::enrichment::{EnrichedRow, LookupOutcome, RowEnricher};
use crate::error::{IoError, Result, ValidationError};
use crate::progress::{ProgressProvider, ProgressUpdate};
use crate::{DEFAULT_COLUMN_LABEL, DEFAULT_MAX_CONCURRENT_ROWS};
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Configuration for batch processing
#[derive(Debug, Clone)]
pub struct BatchProcessorConfig {
    /// Upper bound on rows being resolved at the same time
    pub max_concurrent_rows: usize,
    /// Header label of the appended column
    pub column_label: String,
}

impl Default for BatchProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_rows: DEFAULT_MAX_CONCURRENT_ROWS,
            column_label: DEFAULT_COLUMN_LABEL.to_string(),
        }
    }
}

/// Tally of a processed dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Data rows written (header excluded)
    pub rows: usize,
    pub found: usize,
    pub not_found: usize,
    /// Rows whose lookup errored; "not found" is not counted here
    pub failed: usize,
    pub total_time: Duration,
}

impl BatchSummary {
    fn record(&mut self, outcome: &LookupOutcome) {
        self.rows += 1;
        match outcome {
            LookupOutcome::Found(_) => self.found += 1,
            LookupOutcome::NotFound => self.not_found += 1,
            LookupOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Enriches a whole dataset
pub struct BatchProcessor {
    enricher: Arc<RowEnricher>,
    config: BatchProcessorConfig,
}

impl BatchProcessor {
    pub fn new(enricher: Arc<RowEnricher>, config: BatchProcessorConfig) -> Self {
        Self { enricher, config }
    }

    pub fn config(&self) -> &BatchProcessorConfig {
        &self.config
    }

    /// Enrich the dataset at `input` and write it to `output`
    ///
    /// The output file is created before any lookup runs, so an unwritable
    /// destination fails the run without touching the catalog. File access
    /// goes through `tokio::fs`; parsing and encoding work on memory.
    pub async fn process_paths(
        &self,
        input: &Path,
        output: &Path,
        progress: Arc<dyn ProgressProvider>,
    ) -> Result<BatchSummary> {
        let data = tokio::fs::read(input)
            .await
            .map_err(|e| IoError::from_std(e).with_path(input))?;
        let mut output_file = tokio::fs::File::create(output)
            .await
            .map_err(|e| IoError::from_std(e).with_path(output))?;

        info!(
            "Enriching {} into {}",
            input.display(),
            output.display()
        );
        let mut encoded = Vec::with_capacity(data.len());
        let summary = self
            .process(&data, &mut encoded, Arc::clone(&progress))
            .await?;

        output_file
            .write_all(&encoded)
            .await
            .map_err(|e| IoError::from_std(e).with_path(output))?;
        output_file
            .flush()
            .await
            .map_err(|e| IoError::from_std(e).with_path(output))?;

        progress.report(ProgressUpdate::Status {
            message: format!("Wrote {}", output.display()),
        });
        Ok(summary)
    }

    /// Enrich CSV `input` into `writer`
    ///
    /// The first record is the header and is written back with the cover
    /// column label appended. Ragged rows are accepted and passed through.
    /// A blank line is a row with no fields: it is kept and counted as failed.
    pub async fn process<W: Write>(
        &self,
        input: &[u8],
        writer: W,
        progress: Arc<dyn ProgressProvider>,
    ) -> Result<BatchSummary> {
        if self.config.max_concurrent_rows == 0 {
            return Err(
                ValidationError::invalid_parameter("max_concurrent_rows", "must be greater than 0")
                    .into(),
            );
        }

        let start_time = Instant::now();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        let headers = csv_reader.byte_headers()?.clone();
        if headers.is_empty() {
            debug!("Input has no header record, nothing to enrich");
            csv_writer.flush()?;
            let summary = BatchSummary {
                total_time: start_time.elapsed(),
                ..Default::default()
            };
            progress.report(ProgressUpdate::Summary(summary.clone()));
            return Ok(summary);
        }

        let mut header_out = decode_record(&headers);
        header_out.push(self.config.column_label.clone());
        csv_writer.write_record(&header_out)?;

        // Every row is parsed before the first task starts
        let rows = read_rows(&mut csv_reader, input)?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_rows));
        let pending: Vec<(Vec<String>, JoinHandle<EnrichedRow>)> = rows
            .into_iter()
            .map(|row| {
                let enricher = Arc::clone(&self.enricher);
                let semaphore = Arc::clone(&semaphore);
                let task_row = row.clone();
                let handle = tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return EnrichedRow::failed(task_row, "row scheduler closed"),
                    };
                    enricher.enrich(task_row).await
                });
                (row, handle)
            })
            .collect();

        let total = pending.len();
        debug!(
            "Dispatched {total} rows with at most {} in flight",
            self.config.max_concurrent_rows
        );
        progress.report(ProgressUpdate::RowsDispatched { total });

        let layout = self.enricher.layout();
        let mut summary = BatchSummary::default();
        let mut pending = pending.into_iter().enumerate();
        while let Some((index, (row, handle))) = pending.next() {
            let track_name = row.get(layout.track_column).cloned();
            let artist_name = row.get(layout.artist_column).cloned();

            let enriched = match handle.await {
                Ok(enriched) => enriched,
                Err(join_err) => {
                    warn!("Row {index} task did not complete: {join_err}");
                    EnrichedRow::failed(row, format!("row task aborted: {join_err}"))
                }
            };

            summary.record(&enriched.outcome);
            if let Err(err) = csv_writer.write_record(&enriched.fields) {
                let remaining = pending.len();
                warn!("Output write failed at row {index}, cancelling {remaining} pending rows");
                for (_, (_, handle)) in pending {
                    handle.abort();
                }
                return Err(err.into());
            }
            progress.report(ProgressUpdate::RowCompleted {
                index,
                track_name,
                artist_name,
                outcome: enriched.outcome,
            });
        }
        csv_writer.flush()?;

        summary.total_time = start_time.elapsed();
        info!(
            "Enriched {} rows: {} found, {} not found, {} failed in {:?}",
            summary.rows, summary.found, summary.not_found, summary.failed, summary.total_time
        );
        progress.report(ProgressUpdate::Summary(summary.clone()));

        Ok(summary)
    }
}

/// Decode every data record after the header
///
/// The parser skips blank lines; each one is restored here as an empty row
/// at its original position.
fn read_rows(csv_reader: &mut csv::Reader<&[u8]>, input: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut blank_lines = BlankLines::new(input, csv_reader.position().byte());
    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();

    while csv_reader.read_byte_record(&mut record)? {
        let skipped = blank_lines.advance_to(csv_reader.position().byte());
        rows.extend(std::iter::repeat_with(Vec::new).take(skipped));
        rows.push(decode_record(&record));
    }
    let trailing = blank_lines.advance_to(input.len() as u64);
    rows.extend(std::iter::repeat_with(Vec::new).take(trailing));

    if rows.iter().any(Vec::is_empty) {
        debug!("Input contains blank lines, kept as empty rows");
    }
    Ok(rows)
}

/// Cursor over the raw input between consecutive parsed records
struct BlankLines<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> BlankLines<'a> {
    fn new(input: &'a [u8], offset: u64) -> Self {
        let offset = usize::try_from(offset).map_or(input.len(), |o| o.min(input.len()));
        Self { input, offset }
    }

    /// Count the blank lines between the last position and `end`, then move to `end`
    fn advance_to(&mut self, end: u64) -> usize {
        let end = usize::try_from(end).map_or(self.input.len(), |e| e.min(self.input.len()));
        let start = self.offset.min(end);
        self.offset = end;

        let mut span = &self.input[start..end];
        // The LF of a CRLF terminator can be left over from the previous record
        if start > 0 && self.input[start - 1] == b'\r' && span.first() == Some(&b'\n') {
            span = &span[1..];
        }
        count_line_breaks(span)
    }
}

/// Line breaks at the start of `span`; CRLF, LF and CR each count once
fn count_line_breaks(span: &[u8]) -> usize {
    let mut breaks = 0;
    let mut bytes = span
        .iter()
        .take_while(|&&b| b == b'\r' || b == b'\n')
        .peekable();
    while let Some(&byte) = bytes.next() {
        if byte == b'\r' && bytes.peek() == Some(&&b'\n') {
            bytes.next();
        }
        breaks += 1;
    }
    breaks
}

/// Fields of a raw record; invalid UTF-8 is replaced rather than failing the run
fn decode_record(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogApi;
    use crate::enrichment::RowLayout;
    use crate::progress::NullProvider;
    use async_trait::async_trait;

    /// Resolves every track to a URL derived from its name
    struct EchoCatalog;

    #[async_trait]
    impl CatalogApi for EchoCatalog {
        async fn obtain_token(&self) -> crate::Result<String> {
            Ok("token".to_string())
        }

        async fn search_track(&self, track: &str, _artist: &str) -> crate::Result<Option<String>> {
            Ok(Some(format!("https://img/{track}")))
        }
    }

    fn processor(config: BatchProcessorConfig) -> BatchProcessor {
        let enricher = RowEnricher::new(Arc::new(EchoCatalog), RowLayout::default());
        BatchProcessor::new(Arc::new(enricher), config)
    }

    async fn run(input: &str, config: BatchProcessorConfig) -> (String, BatchSummary) {
        let mut output = Vec::new();
        let summary = processor(config)
            .process(input.as_bytes(), &mut output, Arc::new(NullProvider))
            .await
            .unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }

    #[tokio::test]
    async fn test_header_gets_label() {
        let (output, summary) = run("id,artist,album,track\n", BatchProcessorConfig::default()).await;
        assert_eq!(output, "id,artist,album,track,Cover_image_url\n");
        assert_eq!(summary.rows, 0);
    }

    #[tokio::test]
    async fn test_custom_label() {
        let config = BatchProcessorConfig {
            column_label: "cover".to_string(),
            ..Default::default()
        };
        let (output, _) = run("id,artist,album,track\n1,A,B,T\n", config).await;
        assert_eq!(output, "id,artist,album,track,cover\n1,A,B,T,https://img/T\n");
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_output() {
        let (output, summary) = run("", BatchProcessorConfig::default()).await;
        assert!(output.is_empty());
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_ragged_rows_pass_through() {
        let (output, summary) = run(
            "id,artist,album,track\n1,A,B,T,extra\n2,A\n",
            BatchProcessorConfig::default(),
        )
        .await;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "1,A,B,T,extra,https://img/T");
        assert_eq!(lines[2], "2,A,");
        assert_eq!(summary.found, 1);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let config = BatchProcessorConfig {
            max_concurrent_rows: 0,
            ..Default::default()
        };
        let mut output = Vec::new();
        let result = processor(config)
            .process("h\n".as_bytes(), &mut output, Arc::new(NullProvider))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_does_not_abort() {
        let mut input = b"id,artist,album,track\n1,A,B,".to_vec();
        input.extend_from_slice(&[0xff, b'T']);
        input.push(b'\n');

        let mut output = Vec::new();
        let summary = processor(BatchProcessorConfig::default())
            .process(input.as_slice(), &mut output, Arc::new(NullProvider))
            .await
            .unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.found, 1);
    }

    #[tokio::test]
    async fn test_blank_line_becomes_failed_row() {
        let (output, summary) = run(
            "id,artist,year,track\n1,A,2000,T\n\n2,B,2001,U\n",
            BatchProcessorConfig::default(),
        )
        .await;
        assert_eq!(
            output,
            "id,artist,year,track,Cover_image_url\n1,A,2000,T,https://img/T\n\"\"\n2,B,2001,U,https://img/U\n"
        );
        assert_eq!((summary.rows, summary.found, summary.failed), (3, 2, 1));
    }

    #[tokio::test]
    async fn test_blank_lines_with_crlf_terminators() {
        let (output, summary) = run(
            "id,artist,year,track\r\n1,A,2000,T\r\n\r\n\r\n2,B,2001,U\r\n",
            BatchProcessorConfig::default(),
        )
        .await;
        assert_eq!(output.lines().count(), 5);
        assert!(!output.contains('\r'));
        assert_eq!((summary.rows, summary.failed), (4, 2));
    }

    #[tokio::test]
    async fn test_trailing_blank_lines_are_kept() {
        let (output, summary) = run(
            "id,artist,year,track\n1,A,2000,T\n\n\n",
            BatchProcessorConfig::default(),
        )
        .await;
        assert!(output.ends_with("https://img/T\n\"\"\n\"\"\n"));
        assert_eq!((summary.rows, summary.failed), (3, 2));
    }

    #[tokio::test]
    async fn test_newlines_inside_quoted_field_are_not_blank_lines() {
        let (output, summary) = run(
            "id,artist,album,track\n1,A,\"B\n\nC\",T\n",
            BatchProcessorConfig::default(),
        )
        .await;
        assert_eq!((summary.rows, summary.failed), (1, 0));
        assert!(output.ends_with("\"B\n\nC\",T,https://img/T\n"));
    }

    #[test]
    fn test_count_line_breaks() {
        assert_eq!(count_line_breaks(b""), 0);
        assert_eq!(count_line_breaks(b"1,A"), 0);
        assert_eq!(count_line_breaks(b"\n\n1,A"), 2);
        assert_eq!(count_line_breaks(b"\r\n\r\n1,A\r\n"), 2);
        assert_eq!(count_line_breaks(b"\r\r\n"), 2);
    }

    #[test]
    fn test_blank_lines_skip_split_crlf() {
        let input = b"h\r\n\r\nx";
        // Positioned between the CR and LF of the header terminator
        let mut blank_lines = BlankLines::new(input, 2);
        assert_eq!(blank_lines.advance_to(input.len() as u64), 1);
        assert_eq!(blank_lines.advance_to(input.len() as u64), 0);
    }

    #[test]
    fn test_summary_record() {
        let mut summary = BatchSummary::default();
        summary.record(&LookupOutcome::Found("u".to_string()));
        summary.record(&LookupOutcome::NotFound);
        summary.record(&LookupOutcome::Failed("x".to_string()));
        assert_eq!(
            (summary.rows, summary.found, summary.not_found, summary.failed),
            (3, 1, 1, 1)
        );
    }
}
