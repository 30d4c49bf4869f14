//! TDP Common Library
//!
//! Shared error handling and logging initialization for the TDP workspace.
//!
//! # Overview
//!
//! This crate provides the foundation used by every TDP workspace member:
//!
//! - **Error Handling**: the [`TurfError`] type and [`Result`] alias
//! - **Logging**: `tracing`-based structured logging with console/file
//!   targets, text/JSON formats, and environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use turf_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("application started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, TurfError};
