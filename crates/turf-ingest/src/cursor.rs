//! Incremental-resume cursors
//!
//! A cursor is an opaque 14-digit `YYYYMMDDHHMMSS`-shaped value meaning
//! "ingest everything after this point". The provider additionally accepts
//! an all-nines sentinel that requests a full setup load.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use turf_common::TurfError;

/// Opaque resume cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    /// Sentinel requesting a full setup load instead of an increment
    pub const SETUP_SENTINEL: &'static str = "99999999999999";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The setup-load sentinel cursor
    pub fn setup() -> Self {
        Self(Self::SETUP_SENTINEL.to_string())
    }

    /// Cursor at an exact local timestamp
    pub fn from_datetime(at: DateTime<Local>) -> Self {
        Self(at.format("%Y%m%d%H%M%S").to_string())
    }

    /// Cursor at the start of a calendar day
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y%m%d000000").to_string())
    }

    /// Cursor at the start of a raw `YYYYMMDD` day as stored on a race row
    pub fn from_day_str(yyyymmdd: &str) -> Self {
        Self(format!("{yyyymmdd}000000"))
    }

    /// Parse an operator-supplied cursor, enforcing the 14-digit shape
    pub fn parse(value: &str) -> Result<Self, TurfError> {
        let trimmed = value.trim();
        if trimmed.len() == 14 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TurfError::InvalidCursor(format!(
                "expected 14 digits (YYYYMMDDHHMMSS), got {value:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_setup_sentinel(&self) -> bool {
        self.0 == Self::SETUP_SENTINEL
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
