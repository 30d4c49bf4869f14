//! Ingestion run log
//!
//! Every run writes an append-only checkpoint row: begun as Running,
//! finished as Success or Error with its counts. The latest Success
//! checkpoint's `to_cursor` seeds the next incremental run, so the row
//! shape must stay stable across versions.

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::cursor::Cursor;

/// How a run was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Full initial load
    Setup,
    /// Incremental update from a cursor
    Update,
    /// Operator-requested one-off pull
    OnDemand,
}

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Setup => "setup",
            RunType::Update => "update",
            RunType::OnDemand => "on_demand",
        }
    }
}

impl From<String> for RunType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "setup" => RunType::Setup,
            "on_demand" => RunType::OnDemand,
            _ => RunType::Update,
        }
    }
}

/// Terminal or in-flight state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "running" => RunStatus::Running,
            "success" => RunStatus::Success,
            _ => RunStatus::Error,
        }
    }
}

/// One ingestion run's durable record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub run_id: Uuid,
    pub run_type: RunType,
    pub data_spec: String,
    pub from_cursor: Option<String>,
    pub to_cursor: Option<String>,
    pub records_read: i64,
    pub records_errored: i64,
    pub status: RunStatus,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

/// Append-only store over the `checkpoints` table
#[derive(Clone)]
pub struct CheckpointStore {
    db: SqlitePool,
}

impl CheckpointStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a Running checkpoint and return its identity.
    ///
    /// Concurrent runs on one data spec are operationally forbidden; an
    /// existing Running row is logged, not rejected.
    pub async fn begin(
        &self,
        run_type: RunType,
        data_spec: &str,
        from: &Cursor,
    ) -> Result<Uuid> {
        let running: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkpoints WHERE data_spec = ?1 AND status = 'running'",
        )
        .bind(data_spec)
        .fetch_one(&self.db)
        .await
        .context("Failed to check for running checkpoints")?;

        if running > 0 {
            warn!(
                data_spec = data_spec,
                running = running,
                "another run appears to be in flight for this data spec"
            );
        }

        let run_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO checkpoints (run_id, run_type, data_spec, from_cursor, status)
            VALUES (?1, ?2, ?3, ?4, 'running')
            "#,
        )
        .bind(run_id.to_string())
        .bind(run_type.as_str())
        .bind(data_spec)
        .bind(from.as_str())
        .execute(&self.db)
        .await
        .context("Failed to insert checkpoint")?;

        Ok(run_id)
    }

    /// Move a checkpoint to a terminal status with its final counts
    pub async fn finish(
        &self,
        run_id: Uuid,
        status: RunStatus,
        records_read: i64,
        records_errored: i64,
        to_cursor: Option<&Cursor>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE checkpoints
            SET status = ?2,
                records_read = ?3,
                records_errored = ?4,
                to_cursor = ?5,
                finished_at = datetime('now')
            WHERE run_id = ?1
            "#,
        )
        .bind(run_id.to_string())
        .bind(status.as_str())
        .bind(records_read)
        .bind(records_errored)
        .bind(to_cursor.map(Cursor::as_str))
        .execute(&self.db)
        .await
        .context("Failed to finish checkpoint")?;

        Ok(())
    }

    /// Resolve the next incremental start cursor for a data spec.
    ///
    /// Three-tier fallback: the latest Success checkpoint's `to_cursor`;
    /// else the newest stored race date; else one year before now. An
    /// incremental run is therefore always well-defined, even on a fresh
    /// store.
    pub async fn latest_cursor(&self, data_spec: &str) -> Result<Cursor> {
        let checkpointed: Option<String> = sqlx::query_scalar(
            r#"
            SELECT to_cursor FROM checkpoints
            WHERE data_spec = ?1 AND status = 'success' AND to_cursor IS NOT NULL
            ORDER BY finished_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(data_spec)
        .fetch_optional(&self.db)
        .await
        .context("Failed to query latest checkpoint cursor")?;

        if let Some(cursor) = checkpointed {
            return Ok(Cursor::new(cursor));
        }

        let latest_race_day: Option<String> =
            sqlx::query_scalar("SELECT MAX(year || monthday) FROM races")
                .fetch_one(&self.db)
                .await
                .context("Failed to query latest race date")?;

        if let Some(day) = latest_race_day {
            return Ok(Cursor::from_day_str(&day));
        }

        Ok(Cursor::from_datetime(
            Local::now() - chrono::Duration::days(365),
        ))
    }

    /// Fetch one checkpoint by id
    pub async fn get(&self, run_id: Uuid) -> Result<Option<Checkpoint>> {
        let row = sqlx::query("SELECT * FROM checkpoints WHERE run_id = ?1")
            .bind(run_id.to_string())
            .fetch_optional(&self.db)
            .await
            .context("Failed to fetch checkpoint")?;

        row.map(|r| checkpoint_from_row(&r)).transpose()
    }

    /// Most recent checkpoints, newest first
    pub async fn recent(&self, limit: i64) -> Result<Vec<Checkpoint>> {
        let rows = sqlx::query(
            "SELECT * FROM checkpoints ORDER BY started_at DESC, rowid DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("Failed to list checkpoints")?;

        rows.iter().map(checkpoint_from_row).collect()
    }
}

fn checkpoint_from_row(row: &SqliteRow) -> Result<Checkpoint> {
    let run_id: String = row.try_get("run_id")?;
    let run_type: String = row.try_get("run_type")?;
    let status: String = row.try_get("status")?;

    Ok(Checkpoint {
        run_id: Uuid::parse_str(&run_id).context("Malformed run id in checkpoint row")?,
        run_type: run_type.into(),
        data_spec: row.try_get("data_spec")?,
        from_cursor: row.try_get("from_cursor")?,
        to_cursor: row.try_get("to_cursor")?,
        records_read: row.try_get("records_read")?,
        records_errored: row.try_get("records_errored")?,
        status: status.into(),
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}
