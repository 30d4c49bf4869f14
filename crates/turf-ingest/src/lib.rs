//! TDP Ingest Library
//!
//! Decode-and-persist pipeline for the racing data stream: fixed-width
//! records multiplexed with control codes come in, typed entities land in
//! an embedded relational store under batching, transactional, and
//! incremental-resume guarantees.
//!
//! # Architecture
//!
//! - [`decode`] - pure field accessors and the per-kind record decoder
//! - [`codes`] - static code-to-name lookup tables
//! - [`stream`] - the external source capability and a replay backend
//! - [`checkpoint`] - the append-only run log and cursor resolution
//! - [`storage`] - upsert mapping with the two-stage batch commit policy
//! - [`pipeline`] - the per-run read/decode/batch/commit driver
//! - [`service`] - the function-call surface for front ends
//!
//! # Example
//!
//! ```no_run
//! use turf_ingest::config::IngestConfig;
//! use turf_ingest::stream::ReplaySource;
//! use turf_ingest::{db, service};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let pool = db::connect(&config.database).await?;
//!     db::init_schema(&pool).await?;
//!
//!     let source = ReplaySource::new(&config.capture_dir);
//!     let report = service::run_update(pool, source, config.pipeline(), "DIFF", None).await?;
//!     tracing::info!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod codes;
pub mod config;
pub mod cursor;
pub mod db;
pub mod decode;
pub mod pipeline;
pub mod service;
pub mod storage;
pub mod stream;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointStore, RunStatus, RunType};
pub use cursor::Cursor;
pub use decode::{decode, DecodeError, DecodedRecord};
pub use pipeline::{Pipeline, PipelineConfig, RunReport};
pub use storage::RecordStore;
pub use stream::{OpenMode, OpenSummary, ReadEvent, RecordSource, ReplaySource, SourceError};
