//! Function-call surface for front ends
//!
//! Thin entry points over the pipeline and stores: setup loads,
//! incremental updates, and store statistics. A front-end API, if any,
//! calls these; nothing here knows about transports.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::checkpoint::{Checkpoint, CheckpointStore, RunType};
use crate::cursor::Cursor;
use crate::pipeline::{Pipeline, PipelineConfig, RunReport};
use crate::storage::{RecordStore, TableCounts};
use crate::stream::RecordSource;

/// Store statistics for operators
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub counts: TableCounts,
    /// Newest race date on record, `YYYYMMDD`
    pub latest_race_day: Option<String>,
    /// Most recent checkpoints, newest first
    pub recent_runs: Vec<Checkpoint>,
}

/// Run a full setup load for a data spec
pub async fn run_setup<S: RecordSource>(
    db: SqlitePool,
    source: S,
    config: PipelineConfig,
    data_spec: &str,
) -> Result<RunReport> {
    Pipeline::new(db, source, config)
        .run(RunType::Setup, data_spec, None)
        .await
}

/// Run an incremental update for a data spec
///
/// With no explicit `from`, the start cursor resolves through the
/// checkpoint store's fallback chain.
pub async fn run_update<S: RecordSource>(
    db: SqlitePool,
    source: S,
    config: PipelineConfig,
    data_spec: &str,
    from: Option<Cursor>,
) -> Result<RunReport> {
    Pipeline::new(db, source, config)
        .run(RunType::Update, data_spec, from)
        .await
}

/// Per-table row counts plus the most recent run history
pub async fn stats(db: SqlitePool) -> Result<StoreStats> {
    let store = RecordStore::new(db.clone());
    let checkpoints = CheckpointStore::new(db);

    Ok(StoreStats {
        counts: store.table_counts().await?,
        latest_race_day: store.latest_race_day().await?,
        recent_runs: checkpoints.recent(5).await?,
    })
}
