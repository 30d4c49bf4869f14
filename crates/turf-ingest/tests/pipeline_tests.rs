//! Ingestion pipeline tests over a scripted source

mod common;

use std::time::Duration;

use common::{
    o1_record, ra_record, se_record, test_pool, um_record, wf_record, ScriptedSource, DERBY_KEY,
};
use tokio_util::sync::CancellationToken;
use turf_ingest::checkpoint::{CheckpointStore, RunStatus, RunType};
use turf_ingest::cursor::Cursor;
use turf_ingest::pipeline::{Pipeline, PipelineConfig};
use turf_ingest::stream::ReadEvent;

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        batch_size: 2,
        wait_interval: Duration::from_millis(1),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_run_decodes_and_persists_stream() {
    let pool = test_pool().await;

    let source = ScriptedSource::from_records(vec![
        ra_record(&DERBY_KEY, &["120", "121"]),
        se_record(&DERBY_KEY, " 7", "2022104567", "Runner A"),
        se_record(&DERBY_KEY, " 8", "2022104568", "Runner B"),
        o1_record(&DERBY_KEY, &[(0, " 7", "0028"), (1, " 8", "0102")]),
        wf_record(&DERBY_KEY, &[(0, " 7", "488")]),
        um_record("2022104567", "Runner A"),
    ]);

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.records_read, 6);
    assert_eq!(report.records_errored, 0);

    let races: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM races")
        .fetch_one(&pool)
        .await
        .unwrap();
    let results: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
        .fetch_one(&pool)
        .await
        .unwrap();
    let odds: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM odds")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(races, 1);
    assert_eq!(results, 2);
    assert_eq!(odds, 2);

    let checkpoint = CheckpointStore::new(pool)
        .get(report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.status, RunStatus::Success);
    assert_eq!(checkpoint.records_read, 6);
    assert!(checkpoint.to_cursor.is_some());
}

#[tokio::test]
async fn test_download_waits_then_clean_end() {
    // Five download-in-progress notices, then a clean end of stream
    let pool = test_pool().await;
    let mut events = vec![ReadEvent::Downloading; 5];
    events.push(ReadEvent::EndOfStream);
    let source = ScriptedSource::new(events);

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.wait_cycles, 5);
    assert_eq!(report.records_read, 0);
    assert_eq!(report.records_errored, 0);

    let checkpoint = CheckpointStore::new(pool)
        .get(report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.status, RunStatus::Success);
    assert_eq!(checkpoint.records_read, 0);
}

#[tokio::test]
async fn test_file_switch_is_informational() {
    let pool = test_pool().await;
    let source = ScriptedSource::new(vec![
        ReadEvent::FileSwitch {
            filename: "RACE0001.dat".to_string(),
        },
        ReadEvent::Record {
            payload: ra_record(&DERBY_KEY, &[]),
            filename: "RACE0001.dat".to_string(),
        },
        ReadEvent::FileSwitch {
            filename: "RACE0002.dat".to_string(),
        },
        ReadEvent::EndOfStream,
    ]);

    let report = Pipeline::new(pool, source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.files_switched, 2);
    assert_eq!(report.records_read, 1);
}

#[tokio::test]
async fn test_decode_errors_within_budget_keep_the_run_alive() {
    let pool = test_pool().await;
    let mut payloads = vec![ra_record(&DERBY_KEY, &[])];
    payloads.push(b"X".to_vec()); // hopeless: shorter than the tag
    payloads.push(se_record(&DERBY_KEY, " 7", "2022104567", "Runner A"));
    let source = ScriptedSource::from_records(payloads);

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.records_read, 2);
    assert_eq!(report.records_errored, 1);
}

#[tokio::test]
async fn test_error_budget_exhaustion_aborts_with_error_checkpoint() {
    let pool = test_pool().await;

    // More hopeless records than the budget tolerates
    let payloads: Vec<Vec<u8>> = (0..20).map(|_| b"X".to_vec()).collect();
    let source = ScriptedSource::from_records(payloads);

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Error);
    // Aborted as soon as the budget was exceeded, not after all twenty
    assert_eq!(report.records_errored, 11);
    assert_eq!(report.records_read, 0);

    let checkpoint = CheckpointStore::new(pool)
        .get(report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.status, RunStatus::Error);
    assert_eq!(checkpoint.records_errored, 11);
}

#[tokio::test]
async fn test_source_faults_count_against_the_budget() {
    let pool = test_pool().await;
    let source = ScriptedSource::new(vec![
        ReadEvent::Fault { code: -502 },
        ReadEvent::Record {
            payload: ra_record(&DERBY_KEY, &[]),
            filename: String::new(),
        },
        ReadEvent::Fault { code: -403 },
        ReadEvent::EndOfStream,
    ]);

    let report = Pipeline::new(pool, source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.records_read, 1);
    assert_eq!(report.records_errored, 2);
}

#[tokio::test]
async fn test_open_failure_writes_error_checkpoint() {
    let pool = test_pool().await;
    let source = ScriptedSource::failing_open(-211);

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Error);
    assert_eq!(report.records_read, 0);

    let checkpoint = CheckpointStore::new(pool)
        .get(report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.status, RunStatus::Error);
    assert_eq!(checkpoint.records_read, 0);
    assert!(checkpoint.to_cursor.is_none());
}

#[tokio::test]
async fn test_cancellation_is_honored_with_error_checkpoint() {
    let pool = test_pool().await;
    let source = ScriptedSource::from_records(vec![ra_record(&DERBY_KEY, &[])]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .with_cancellation(cancel)
        .run(RunType::Update, "DIFF", Some(Cursor::new("20250601000000")))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Error);
    assert_eq!(report.records_read, 0);

    let checkpoint = CheckpointStore::new(pool)
        .get(report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.status, RunStatus::Error);
}

#[tokio::test]
async fn test_setup_run_uses_sentinel_cursor() {
    let pool = test_pool().await;
    let source = ScriptedSource::new(vec![ReadEvent::EndOfStream]);

    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Setup, "RACE", None)
        .await
        .unwrap();

    let checkpoint = CheckpointStore::new(pool)
        .get(report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.run_type, RunType::Setup);
    assert_eq!(
        checkpoint.from_cursor.as_deref(),
        Some(Cursor::SETUP_SENTINEL)
    );
}

#[tokio::test]
async fn test_update_resumes_from_prior_success_cursor() {
    let pool = test_pool().await;

    // Seed a finished run whose cursor the next update must resume from
    let checkpoints = CheckpointStore::new(pool.clone());
    let prior = checkpoints
        .begin(RunType::Update, "DIFF", &Cursor::new("20250101000000"))
        .await
        .unwrap();
    checkpoints
        .finish(
            prior,
            RunStatus::Success,
            5,
            0,
            Some(&Cursor::new("20250601120000")),
        )
        .await
        .unwrap();

    let source = ScriptedSource::new(vec![ReadEvent::EndOfStream]);
    let report = Pipeline::new(pool.clone(), source, fast_config())
        .run(RunType::Update, "DIFF", None)
        .await
        .unwrap();

    let checkpoint = checkpoints.get(report.run_id).await.unwrap().unwrap();
    assert_eq!(checkpoint.from_cursor.as_deref(), Some("20250601120000"));
}
