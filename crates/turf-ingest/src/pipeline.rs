//! Ingestion pipeline
//!
//! Drives one run against an external record source: open, read/decode
//! into batches, commit batches through the two-stage policy, drain, and
//! write the terminal checkpoint. Single-threaded and run-to-completion;
//! the source session is owned exclusively for the life of the run, and
//! batches commit strictly in arrival order because later records for the
//! same key must overwrite earlier ones.

use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::checkpoint::{CheckpointStore, RunStatus, RunType};
use crate::cursor::Cursor;
use crate::decode::{decode, DecodedRecord};
use crate::storage::RecordStore;
use crate::stream::{error_message, OpenMode, ReadEvent, RecordSource};

/// Default records per transactional batch
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default tolerated decode/protocol errors per run
pub const DEFAULT_ERROR_BUDGET: i64 = 10;
/// Default backoff while the source downloads in the background
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(1);
/// Default read buffer size in bytes (largest documented record fits)
pub const DEFAULT_BUFFER_SIZE: usize = 110_000;

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub error_budget: i64,
    pub wait_interval: Duration,
    pub buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            error_budget: DEFAULT_ERROR_BUDGET,
            wait_interval: DEFAULT_WAIT_INTERVAL,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Final accounting for one run; partial success is reported as-is
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub records_read: i64,
    pub records_errored: i64,
    pub files_switched: i64,
    pub wait_cycles: i64,
}

impl RunReport {
    /// One-line summary for operators
    pub fn summary(&self) -> String {
        format!(
            "run {} finished with status {:?}: {} read, {} errored",
            self.run_id, self.status, self.records_read, self.records_errored
        )
    }
}

/// One-run ingestion driver
///
/// Owns the source session from open through close. Construct per run;
/// there is no global connection state.
pub struct Pipeline<S: RecordSource> {
    store: RecordStore,
    checkpoints: CheckpointStore,
    source: S,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl<S: RecordSource> Pipeline<S> {
    pub fn new(db: SqlitePool, source: S, config: PipelineConfig) -> Self {
        Self {
            store: RecordStore::new(db.clone()),
            checkpoints: CheckpointStore::new(db),
            source,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an external cancellation signal
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute one run.
    ///
    /// `from` overrides the start cursor; otherwise setup runs use the
    /// setup sentinel and incremental runs resolve through the checkpoint
    /// store's fallback chain. Always writes a terminal checkpoint.
    pub async fn run(
        &mut self,
        run_type: RunType,
        data_spec: &str,
        from: Option<Cursor>,
    ) -> Result<RunReport> {
        let from = match from {
            Some(cursor) => cursor,
            None if run_type == RunType::Setup => Cursor::setup(),
            None => self.checkpoints.latest_cursor(data_spec).await?,
        };

        info!(
            run_type = run_type.as_str(),
            data_spec = data_spec,
            from = %from,
            "starting ingestion run"
        );

        let run_id = self.checkpoints.begin(run_type, data_spec, &from).await?;

        let mode = if run_type == RunType::Setup {
            OpenMode::Setup
        } else {
            OpenMode::Normal
        };

        let summary = match self.source.open(data_spec, &from, mode).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(data_spec = data_spec, error = %e, "failed to open source session");
                self.checkpoints
                    .finish(run_id, RunStatus::Error, 0, 0, None)
                    .await?;
                self.source.close().await;
                return Ok(RunReport {
                    run_id,
                    status: RunStatus::Error,
                    records_read: 0,
                    records_errored: 0,
                    files_switched: 0,
                    wait_cycles: 0,
                });
            },
        };

        info!(
            records_available = summary.records_available,
            files_to_download = summary.files_to_download,
            "source session opened"
        );

        let mut records_read: i64 = 0;
        let mut records_errored: i64 = 0;
        let mut files_switched: i64 = 0;
        let mut wait_cycles: i64 = 0;
        let mut aborted = false;
        let mut batch: Vec<DecodedRecord> = Vec::with_capacity(self.config.batch_size);

        loop {
            if self.cancel.is_cancelled() {
                warn!(run_id = %run_id, "run cancelled by operator");
                aborted = true;
                break;
            }

            let event = match self.source.next(self.config.buffer_size).await {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "source read failed");
                    records_errored += 1;
                    if records_errored > self.config.error_budget {
                        error!(errors = records_errored, "error budget exhausted, aborting run");
                        aborted = true;
                        break;
                    }
                    continue;
                },
            };

            match event {
                ReadEvent::Record { payload, .. } => match decode(&payload) {
                    Ok(record) => {
                        batch.push(record);
                        records_read += 1;
                        if batch.len() >= self.config.batch_size {
                            let outcome = self.store.save_batch(&batch).await?;
                            debug!(
                                persisted = outcome.persisted,
                                dropped = outcome.dropped,
                                read = records_read,
                                "batch committed"
                            );
                            batch.clear();
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "record decode failed");
                        records_errored += 1;
                        if records_errored > self.config.error_budget {
                            error!(errors = records_errored, "error budget exhausted, aborting run");
                            aborted = true;
                            break;
                        }
                    },
                },
                ReadEvent::EndOfStream => {
                    info!("stream exhausted");
                    break;
                },
                ReadEvent::FileSwitch { filename } => {
                    files_switched += 1;
                    debug!(file = %filename, count = files_switched, "file switch");
                },
                ReadEvent::Downloading => {
                    wait_cycles += 1;
                    let downloaded = self.source.progress().await;
                    debug!(
                        wait_cycles = wait_cycles,
                        files_downloaded = downloaded,
                        "download in progress, backing off"
                    );
                    tokio::time::sleep(self.config.wait_interval).await;
                },
                ReadEvent::Fault { code } => {
                    error!(code = code, message = error_message(code), "source fault");
                    records_errored += 1;
                    if records_errored > self.config.error_budget {
                        error!(errors = records_errored, "error budget exhausted, aborting run");
                        aborted = true;
                        break;
                    }
                },
            }
        }

        // Drain: flush the final partial batch through the same
        // commit-or-fallback path, then write the terminal checkpoint.
        if !batch.is_empty() {
            let outcome = self.store.save_batch(&batch).await?;
            debug!(
                persisted = outcome.persisted,
                dropped = outcome.dropped,
                "final batch committed"
            );
        }

        let status = if aborted {
            RunStatus::Error
        } else {
            RunStatus::Success
        };
        let to_cursor = summary
            .last_cursor
            .clone()
            .unwrap_or_else(|| Cursor::from_datetime(Local::now()));

        self.checkpoints
            .finish(run_id, status, records_read, records_errored, Some(&to_cursor))
            .await?;
        self.source.close().await;

        let report = RunReport {
            run_id,
            status,
            records_read,
            records_errored,
            files_switched,
            wait_cycles,
        };
        info!(
            run_id = %run_id,
            status = status.as_str(),
            records_read = records_read,
            records_errored = records_errored,
            "run finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.error_budget, 10);
        assert_eq!(config.buffer_size, 110_000);
    }

    #[test]
    fn test_report_summary() {
        let report = RunReport {
            run_id: Uuid::nil(),
            status: RunStatus::Success,
            records_read: 12,
            records_errored: 1,
            files_switched: 2,
            wait_cycles: 0,
        };
        assert!(report.summary().contains("12 read"));
        assert!(report.summary().contains("1 errored"));
    }
}
