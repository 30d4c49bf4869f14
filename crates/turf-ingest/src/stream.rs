//! External record-stream capability
//!
//! The upstream provider multiplexes fixed-width records with control
//! codes over a stateful session. The pipeline depends only on the
//! [`RecordSource`] trait; interop backends map the provider's raw status
//! codes onto [`ReadEvent`] via [`ReadEvent::from_status`].
//!
//! Status contract for a read:
//! - `> 0`  - a record of that byte length is available
//! - `0`    - stream exhausted
//! - `-1`   - file switch, informational only
//! - `-3`   - a background download is still populating the next file
//! - other negatives - a source-level error (see [`error_message`])

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::cursor::Cursor;

/// Open mode for a stored-data session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Incremental pull of everything after the cursor
    Normal,
    /// Current racing week only
    ThisWeek,
    /// Full setup load
    Setup,
    /// Full setup load without the provider's confirmation dialog
    SetupNoDialog,
}

impl OpenMode {
    /// Wire value passed to the provider
    pub fn as_wire(&self) -> i32 {
        match self {
            OpenMode::Normal => 1,
            OpenMode::ThisWeek => 2,
            OpenMode::Setup => 3,
            OpenMode::SetupNoDialog => 4,
        }
    }
}

/// Result of a successful open
#[derive(Debug, Clone, Default)]
pub struct OpenSummary {
    /// Records the session will deliver
    pub records_available: i64,
    /// Files the provider still has to download
    pub files_to_download: i64,
    /// Timestamp of the newest file in the session, if reported
    pub last_cursor: Option<Cursor>,
}

/// Errors surfaced by a record source
#[derive(Error, Debug)]
pub enum SourceError {
    /// A negative protocol status from the provider
    #[error("source protocol error {code}: {message}")]
    Protocol { code: i32, message: &'static str },

    /// Transport-level failure in a local backend
    #[error("source transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl SourceError {
    /// Protocol error with its table-resolved message
    pub fn protocol(code: i32) -> Self {
        SourceError::Protocol {
            code,
            message: error_message(code),
        }
    }
}

/// One unit pulled from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A decodable record
    Record { payload: Vec<u8>, filename: String },
    /// Stream exhausted
    EndOfStream,
    /// The session moved to the next file; no record consumed
    FileSwitch { filename: String },
    /// A background download is still in progress
    Downloading,
    /// Source-level error; counts against the run's error budget
    Fault { code: i32 },
}

impl ReadEvent {
    /// Map a raw provider status onto an event
    pub fn from_status(status: i32, payload: Vec<u8>, filename: String) -> Self {
        match status {
            n if n > 0 => ReadEvent::Record { payload, filename },
            0 => ReadEvent::EndOfStream,
            -1 => ReadEvent::FileSwitch { filename },
            -3 => ReadEvent::Downloading,
            code => ReadEvent::Fault { code },
        }
    }
}

/// Human-readable message for a provider status code
///
/// The table mirrors the provider's documented error conditions; codes
/// outside it resolve to a generic message.
pub fn error_message(code: i32) -> &'static str {
    match code {
        0 => "ok",
        -1 => "parameter error or file switch",
        -2 => "session not initialized",
        -3 => "file download in progress",
        -100 => "unspecified error",
        -101 => "no matching data",
        -102 => "aggregate data not yet published",
        -103 => "aggregate data not yet published for the period",
        -111 => "cancelled by the user",
        -112 => "settings dialog could not be opened",
        -114 => "file delete failed",
        -115 => "file delete in progress",
        -116 => "service not subscribed",
        -118 => "invalid save path",
        -201 => "initialization not performed",
        -202 => "previous session still open",
        -203 => "parameter error",
        -204 => "no matching file",
        -211 => "service key authentication failed",
        -212 => "service key expired",
        -301 => "authentication failed",
        -302 => "service not available",
        -303 => "service expired",
        -401 => "session not open",
        -402 => "buffer too small",
        -403 => "file access failed",
        -411 => "registry read failed",
        -412 => "registry write failed",
        -413 => "registry open failed",
        -421 => "registry key missing",
        -431 => "registry value missing",
        -501 => "start kit download in progress",
        -502 => "server under maintenance",
        -503 => "start kit parameter error",
        -504 => "start kit download failed",
        _ => "unrecognized source error",
    }
}

/// A stateful session against the external record-stream provider
///
/// One ingestion run owns the session exclusively from `open` through
/// `close`. `close` must be idempotent.
#[async_trait]
pub trait RecordSource: Send {
    /// Open a session for a data spec starting after a cursor
    async fn open(
        &mut self,
        data_spec: &str,
        from: &Cursor,
        mode: OpenMode,
    ) -> Result<OpenSummary, SourceError>;

    /// Pull the next unit from the stream
    async fn next(&mut self, buffer_size: usize) -> Result<ReadEvent, SourceError>;

    /// Downloaded-file count for progress reporting while waiting
    async fn progress(&mut self) -> i64;

    /// Close the session; safe to call repeatedly
    async fn close(&mut self);
}

/// Replay backend over a directory of captured stream files
///
/// The live provider persists each delivered file to disk; this source
/// replays such a capture in file-name order, one record per line, with a
/// [`ReadEvent::FileSwitch`] between files. Useful for backfills from an
/// archive and for driving the pipeline where the native interop component
/// is unavailable.
pub struct ReplaySource {
    dir: PathBuf,
    files: VecDeque<PathBuf>,
    pending: VecDeque<Vec<u8>>,
    current_file: String,
    is_open: bool,
    total_files: i64,
}

impl ReplaySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: VecDeque::new(),
            pending: VecDeque::new(),
            current_file: String::new(),
            is_open: false,
            total_files: 0,
        }
    }

    /// Split one captured file into record payloads (one per line)
    fn split_records(bytes: &[u8]) -> VecDeque<Vec<u8>> {
        bytes
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(|line| line.to_vec())
            .collect()
    }
}

#[async_trait]
impl RecordSource for ReplaySource {
    async fn open(
        &mut self,
        data_spec: &str,
        from: &Cursor,
        mode: OpenMode,
    ) -> Result<OpenSummary, SourceError> {
        debug!(
            data_spec = data_spec,
            from = %from,
            mode = ?mode,
            dir = %self.dir.display(),
            "opening replay session"
        );

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut records_available = 0i64;
        for path in &files {
            let bytes = std::fs::read(path)?;
            records_available += Self::split_records(&bytes).len() as i64;
        }

        self.total_files = files.len() as i64;
        self.files = files.into();
        self.pending.clear();
        self.current_file.clear();
        self.is_open = true;

        Ok(OpenSummary {
            records_available,
            files_to_download: 0,
            last_cursor: None,
        })
    }

    async fn next(&mut self, buffer_size: usize) -> Result<ReadEvent, SourceError> {
        if !self.is_open {
            return Err(SourceError::protocol(-401));
        }

        if let Some(payload) = self.pending.pop_front() {
            if payload.len() > buffer_size {
                return Ok(ReadEvent::Fault { code: -402 });
            }
            return Ok(ReadEvent::Record {
                payload,
                filename: self.current_file.clone(),
            });
        }

        match self.files.pop_front() {
            Some(path) => {
                let bytes = std::fs::read(&path)?;
                self.pending = Self::split_records(&bytes);
                self.current_file = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(ReadEvent::FileSwitch {
                    filename: self.current_file.clone(),
                })
            },
            None => Ok(ReadEvent::EndOfStream),
        }
    }

    async fn progress(&mut self) -> i64 {
        // Everything in a capture directory is already on disk
        self.total_files
    }

    async fn close(&mut self) {
        self.is_open = false;
        self.files.clear();
        self.pending.clear();
    }
}
