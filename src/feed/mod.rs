//! Schedule feed ingestion.
//!
//! Parses per-operator schedule directories into normalized, prefixed
//! records. Partial feeds are usable: a missing file is an empty table and
//! a malformed row is skipped, so one broken operator never sinks a build.

mod reader;
mod records;

use std::path::PathBuf;

pub use reader::{read_feeds, read_operator, FeedSet, RawTrip, ServicePattern};

/// Errors from feed ingestion. Only genuine I/O failures surface; missing
/// files and malformed rows are handled inline.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
