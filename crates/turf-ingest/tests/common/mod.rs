//! Shared test helpers: in-memory store, raw record builders, and a
//! scripted record source.

#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use sqlx::SqlitePool;
use turf_ingest::cursor::Cursor;
use turf_ingest::db::{self, DbConfig};
use turf_ingest::stream::{OpenMode, OpenSummary, ReadEvent, RecordSource, SourceError};

/// Fresh in-memory store with the schema applied
pub async fn test_pool() -> SqlitePool {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connect_timeout_secs: 5,
    };
    let pool = db::connect(&config).await.expect("open in-memory store");
    db::init_schema(&pool).await.expect("apply schema");
    pool
}

/// Write an ASCII value at a 1-based offset, growing the buffer with
/// spaces as needed
pub fn place(buf: &mut Vec<u8>, start: usize, value: &str) {
    let begin = start - 1;
    let end = begin + value.len();
    if buf.len() < end {
        buf.resize(end, b' ');
    }
    buf[begin..end].copy_from_slice(value.as_bytes());
}

/// Record skeleton: tag, data classification flag, creation date
pub fn record(tag: &str, data_class: &str, created: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    place(&mut buf, 1, tag);
    place(&mut buf, 3, data_class);
    place(&mut buf, 4, created);
    buf
}

/// Write the six race-key fields starting at a 1-based offset
pub fn place_race_key(buf: &mut Vec<u8>, start: usize, key: &TestRaceKey) {
    place(buf, start, key.year);
    place(buf, start + 4, key.monthday);
    place(buf, start + 8, key.venue);
    place(buf, start + 10, key.meeting);
    place(buf, start + 12, key.day);
    place(buf, start + 14, key.race);
}

#[derive(Clone, Copy)]
pub struct TestRaceKey {
    pub year: &'static str,
    pub monthday: &'static str,
    pub venue: &'static str,
    pub meeting: &'static str,
    pub day: &'static str,
    pub race: &'static str,
}

pub const DERBY_KEY: TestRaceKey = TestRaceKey {
    year: "2025",
    monthday: "0601",
    venue: "05",
    meeting: "03",
    day: "02",
    race: "11",
};

impl TestRaceKey {
    pub fn canonical(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.year, self.monthday, self.venue, self.meeting, self.day, self.race
        )
    }
}

/// Race detail record with populated core fields and lap slots
pub fn ra_record(key: &TestRaceKey, laps: &[&str]) -> Vec<u8> {
    let mut buf = record("RA", "7", "20250601");
    place(&mut buf, 12, "153000");
    place_race_key(&mut buf, 18, key);
    place(&mut buf, 34, "07");
    place(&mut buf, 36, "Tokyo Yushun");
    place(&mut buf, 256, "A");
    place(&mut buf, 257, "12");
    place(&mut buf, 266, "2400");
    place(&mut buf, 270, "10");
    place(&mut buf, 273, "1540");
    place(&mut buf, 277, "18");
    place(&mut buf, 279, "18");
    place(&mut buf, 281, "18");
    place(&mut buf, 283, "1");
    place(&mut buf, 284, "2");
    place(&mut buf, 285, "1");
    for (i, lap) in laps.iter().enumerate() {
        place(&mut buf, 286 + i * 3, lap);
    }
    // Pad to the full fixed width past the sectional groups
    place(&mut buf, 382, " ");
    buf
}

/// Horse entry record for one horse in one race
pub fn se_record(key: &TestRaceKey, horse_number: &str, pedigree_id: &str, name: &str) -> Vec<u8> {
    let mut buf = record("SE", "7", "20250601");
    place_race_key(&mut buf, 12, key);
    place(&mut buf, 28, horse_number);
    place(&mut buf, 30, pedigree_id);
    place(&mut buf, 40, name);
    place(&mut buf, 76, "1");
    place(&mut buf, 77, " 3");
    place(&mut buf, 81, "03");
    place(&mut buf, 153, "570");
    place(&mut buf, 157, "00666");
    place(&mut buf, 162, "C Lemaire");
    place(&mut buf, 196, "Lemaire");
    place(&mut buf, 204, "488");
    place(&mut buf, 207, "  4");
    place(&mut buf, 210, "0");
    place(&mut buf, 211, "00431");
    place(&mut buf, 216, "S Kimura");
    place(&mut buf, 364, " 1");
    place(&mut buf, 366, "2235");
    place(&mut buf, 371, "1/2");
    place(&mut buf, 375, " 028");
    place(&mut buf, 379, " 1");
    place(&mut buf, 381, " ");
    buf
}

/// Horse master record
pub fn um_record(pedigree_id: &str, name: &str) -> Vec<u8> {
    let mut buf = record("UM", "7", "20250601");
    place(&mut buf, 12, pedigree_id);
    place(&mut buf, 22, "0");
    place(&mut buf, 23, "20230115");
    place(&mut buf, 39, name);
    place(&mut buf, 75, "20210224");
    place(&mut buf, 83, "1");
    place(&mut buf, 84, "1");
    place(&mut buf, 85, "03");
    place(&mut buf, 147, "2018100001");
    place(&mut buf, 157, "2015100002");
    place(&mut buf, 167, "2008100003");
    place(&mut buf, 177, "2");
    place(&mut buf, 335, "Hidaka");
    place(&mut buf, 355, " ");
    buf
}

/// One odds slot: (slot index, horse number, win odds)
pub fn o1_record(key: &TestRaceKey, slots: &[(usize, &str, &str)]) -> Vec<u8> {
    let mut buf = record("O1", "2", "20250601");
    place_race_key(&mut buf, 12, key);
    place(&mut buf, 28, "00001234567");
    place(&mut buf, 39, "00007654321");
    for (index, horse_number, win_odds) in slots {
        let base = 72 + index * 16;
        place(&mut buf, base, horse_number);
        place(&mut buf, base + 2, win_odds);
        place(&mut buf, base + 6, "0015");
        place(&mut buf, base + 10, "0021");
        place(&mut buf, base + 14, "1");
        place(&mut buf, base + 15, "2");
    }
    // Full fixed width: 28 slots of 16 bytes from offset 72
    place(&mut buf, 72 + 28 * 16 - 1, " ");
    buf
}

/// One weight slot: (slot index, horse number, body weight)
pub fn wf_record(key: &TestRaceKey, slots: &[(usize, &str, &str)]) -> Vec<u8> {
    let mut buf = record("WF", "2", "20250601");
    place_race_key(&mut buf, 12, key);
    for (index, horse_number, weight) in slots {
        let base = 28 + index * 7;
        place(&mut buf, base, horse_number);
        place(&mut buf, base + 2, weight);
        place(&mut buf, base + 5, "+");
        place(&mut buf, base + 6, "  4");
    }
    place(&mut buf, 28 + 28 * 7 - 1, " ");
    buf
}

/// One fixture slot: (slot index, date, venue)
pub fn ys_record(year: &str, fixtures: &[(usize, &str, &str)]) -> Vec<u8> {
    let mut buf = record("YS", "7", "20250101");
    place(&mut buf, 12, year);
    place(&mut buf, 16, "0");
    for (index, date, venue) in fixtures {
        let base = 17 + index * 16;
        place(&mut buf, base, date);
        place(&mut buf, base + 8, venue);
        place(&mut buf, base + 10, "03");
        place(&mut buf, base + 12, "02");
        place(&mut buf, base + 14, "07");
    }
    // Zero-fill the remaining slots so absent fixtures read as sentinel
    let max_index = fixtures.iter().map(|(i, _, _)| *i).max().unwrap_or(0);
    for index in 0..=max_index {
        if !fixtures.iter().any(|(i, _, _)| i == &index) {
            place(&mut buf, 17 + index * 16, "00000000");
        }
    }
    buf
}

/// Scripted record source: plays back a fixed sequence of events
pub struct ScriptedSource {
    /// Protocol code to fail `open` with, if any
    pub open_failure: Option<i32>,
    pub summary: OpenSummary,
    pub events: VecDeque<ReadEvent>,
    pub progress_value: i64,
    pub progress_calls: i64,
    pub close_calls: i64,
}

impl ScriptedSource {
    pub fn new(events: Vec<ReadEvent>) -> Self {
        Self {
            open_failure: None,
            summary: OpenSummary::default(),
            events: events.into(),
            progress_value: 0,
            progress_calls: 0,
            close_calls: 0,
        }
    }

    pub fn failing_open(code: i32) -> Self {
        let mut source = Self::new(Vec::new());
        source.open_failure = Some(code);
        source
    }

    /// Wrap raw record payloads into record events
    pub fn from_records(payloads: Vec<Vec<u8>>) -> Self {
        let mut events: Vec<ReadEvent> = payloads
            .into_iter()
            .map(|payload| ReadEvent::Record {
                payload,
                filename: "scripted".to_string(),
            })
            .collect();
        events.push(ReadEvent::EndOfStream);
        Self::new(events)
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn open(
        &mut self,
        _data_spec: &str,
        _from: &Cursor,
        _mode: OpenMode,
    ) -> Result<OpenSummary, SourceError> {
        match self.open_failure {
            Some(code) => Err(SourceError::protocol(code)),
            None => Ok(self.summary.clone()),
        }
    }

    async fn next(&mut self, _buffer_size: usize) -> Result<ReadEvent, SourceError> {
        Ok(self.events.pop_front().unwrap_or(ReadEvent::EndOfStream))
    }

    async fn progress(&mut self) -> i64 {
        self.progress_calls += 1;
        self.progress_value
    }

    async fn close(&mut self) {
        self.close_calls += 1;
        self.events.clear();
    }
}
