//! DualSync Core Library
//!
//! Core types, configuration and errors shared by the DualSync replication
//! engine, its storage backends and its HTTP intake.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::DualSyncConfig;
pub use error::{Error, Result};

/// DualSync version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Suffix appended to a source bucket name to form its replica bucket
pub const DEFAULT_DESTINATION_SUFFIX: &str = "-delhi-backup";

/// Bucket label that enrolls a bucket in dual-region replication
pub const DUAL_REGION_LABEL: &str = "dual-region";

/// Label value that must be present for a bucket to be enrolled
pub const DUAL_REGION_SENTINEL: &str = "true";

/// Bytes in one (decimal) gigabyte
pub const BYTES_PER_GB: u64 = 1_000_000_000;

/// Objects at or above this size are handed to the offload pipeline (10 GB)
pub const LARGE_OBJECT_THRESHOLD_BYTES: u64 = 10 * BYTES_PER_GB;
