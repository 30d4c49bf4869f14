//! Fixed-offset field accessors
//!
//! The wire format is fixed-width Shift_JIS text addressed by **1-based**
//! byte offsets, matching the provider's record layout tables. Every
//! accessor here is total: a region that falls partly or wholly outside
//! the buffer decodes to an empty/absent value instead of failing, because
//! truncated records do occur in the stream and must not abort a run.

use encoding_rs::SHIFT_JIS;
use serde::{Deserialize, Serialize};

/// Decode a fixed-width text region, trimming surrounding whitespace.
///
/// Undecodable byte sequences are replaced rather than rejected.
pub fn text(buf: &[u8], start: usize, len: usize) -> String {
    let Some(begin) = start.checked_sub(1) else {
        return String::new();
    };
    if begin >= buf.len() {
        return String::new();
    }
    let end = (begin + len).min(buf.len());
    let (decoded, _, _) = SHIFT_JIS.decode(&buf[begin..end]);
    decoded.trim().to_string()
}

/// Decode a fixed-width region as an integer.
///
/// Blank or non-numeric content yields `None`; callers must distinguish
/// absent from zero.
pub fn integer(buf: &[u8], start: usize, len: usize) -> Option<i64> {
    let s = text(buf, start, len);
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// A `YYYYMMDD` calendar date region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DateField {
    pub year: String,
    pub month: String,
    pub day: String,
    /// Raw `YYYYMMDD` form
    pub raw: String,
}

impl DateField {
    /// True when the region was blank, truncated, or zero-filled
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() || self.raw == "00000000"
    }
}

/// Decode a fixed 8-byte `YYYYMMDD` region
pub fn date(buf: &[u8], start: usize) -> DateField {
    DateField {
        year: text(buf, start, 4),
        month: text(buf, start + 4, 2),
        day: text(buf, start + 6, 2),
        raw: text(buf, start, 8),
    }
}

/// An `HHMMSS` time-of-day region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimeField {
    pub hour: String,
    pub minute: String,
    pub second: String,
    /// Raw `HHMMSS` form
    pub raw: String,
}

/// Decode a fixed 6-byte `HHMMSS` region
pub fn time(buf: &[u8], start: usize) -> TimeField {
    TimeField {
        hour: text(buf, start, 2),
        minute: text(buf, start + 2, 2),
        second: text(buf, start + 4, 2),
        raw: text(buf, start, 6),
    }
}

/// Decode a 4-digit race time as `M:SS.f`.
///
/// The region packs minutes (1 digit), seconds (2 digits), and tenths
/// (1 digit). Malformed input yields `None`.
pub fn race_time(buf: &[u8], start: usize) -> Option<String> {
    let s = text(buf, start, 4);
    if s.len() != 4 {
        return None;
    }
    let minutes: u32 = s.get(0..1)?.parse().ok()?;
    let seconds: u32 = s.get(1..3)?.parse().ok()?;
    let tenths: u32 = s.get(3..4)?.parse().ok()?;
    Some(format!("{}:{:02}.{}", minutes, seconds, tenths))
}
