//! Replay source and service surface tests

mod common;

use std::io::Write;

use common::{o1_record, ra_record, se_record, test_pool, DERBY_KEY};
use turf_ingest::checkpoint::RunStatus;
use turf_ingest::pipeline::PipelineConfig;
use turf_ingest::service;
use turf_ingest::stream::{OpenMode, ReadEvent, RecordSource, ReplaySource};
use turf_ingest::Cursor;

fn write_capture_file(dir: &std::path::Path, name: &str, records: &[Vec<u8>]) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    for record in records {
        file.write_all(record).unwrap();
        file.write_all(b"\r\n").unwrap();
    }
}

#[tokio::test]
async fn test_replay_source_reports_counts_and_switches() {
    let dir = tempfile::tempdir().unwrap();
    write_capture_file(
        dir.path(),
        "RACE0001.dat",
        &[ra_record(&DERBY_KEY, &[]), se_record(&DERBY_KEY, " 1", "2022100001", "A")],
    );
    write_capture_file(dir.path(), "RACE0002.dat", &[o1_record(&DERBY_KEY, &[(0, " 1", "0015")])]);

    let mut source = ReplaySource::new(dir.path());
    let summary = source
        .open("RACE", &Cursor::setup(), OpenMode::Setup)
        .await
        .unwrap();
    assert_eq!(summary.records_available, 3);
    assert_eq!(summary.files_to_download, 0);

    let mut records = 0;
    let mut switches = 0;
    loop {
        match source.next(110_000).await.unwrap() {
            ReadEvent::Record { .. } => records += 1,
            ReadEvent::FileSwitch { .. } => switches += 1,
            ReadEvent::EndOfStream => break,
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(records, 3);
    assert_eq!(switches, 2);

    source.close().await;
    source.close().await; // idempotent
}

#[tokio::test]
async fn test_replay_source_flags_oversized_records() {
    let dir = tempfile::tempdir().unwrap();
    write_capture_file(dir.path(), "RACE0001.dat", &[ra_record(&DERBY_KEY, &[])]);

    let mut source = ReplaySource::new(dir.path());
    source
        .open("RACE", &Cursor::setup(), OpenMode::Setup)
        .await
        .unwrap();

    // First event is the file switch, then the record against a buffer
    // too small to hold it
    assert!(matches!(
        source.next(110_000).await.unwrap(),
        ReadEvent::FileSwitch { .. }
    ));
    assert_eq!(source.next(8).await.unwrap(), ReadEvent::Fault { code: -402 });
}

#[tokio::test]
async fn test_service_setup_run_over_capture() {
    let dir = tempfile::tempdir().unwrap();
    write_capture_file(
        dir.path(),
        "RACE0001.dat",
        &[
            ra_record(&DERBY_KEY, &["120"]),
            se_record(&DERBY_KEY, " 7", "2022104567", "Runner A"),
        ],
    );

    let pool = test_pool().await;
    let source = ReplaySource::new(dir.path());
    let report = service::run_setup(pool.clone(), source, PipelineConfig::default(), "RACE")
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.records_read, 2);

    let stats = service::stats(pool).await.unwrap();
    assert_eq!(stats.counts.races, 1);
    assert_eq!(stats.counts.results, 1);
    assert_eq!(stats.latest_race_day.as_deref(), Some("20250601"));
    assert_eq!(stats.recent_runs.len(), 1);
    assert_eq!(stats.recent_runs[0].status, RunStatus::Success);
}

#[tokio::test]
async fn test_replay_open_on_missing_directory_fails_the_run() {
    let pool = test_pool().await;
    let source = ReplaySource::new("/definitely/not/a/capture/dir");

    let report = service::run_update(
        pool.clone(),
        source,
        PipelineConfig::default(),
        "DIFF",
        Some(Cursor::new("20250601000000")),
    )
    .await
    .unwrap();

    assert_eq!(report.status, RunStatus::Error);

    let stats = service::stats(pool).await.unwrap();
    assert_eq!(stats.recent_runs.len(), 1);
    assert_eq!(stats.recent_runs[0].status, RunStatus::Error);
}