//! Station reconciliation.
//!
//! Identifies one physical station across operators and propagates
//! transfers accordingly: the curated manifest, the station index (logical
//! stations and city groups), and the transfer index with its per-link
//! minimum-dwell categories.

mod manifest;
mod names;
mod reconcile;
mod transfers;

use std::path::PathBuf;

pub use manifest::{ManifestStation, StationManifest};
pub use names::{country_from_uic, eurostar_slug, normalize_name, uic_code};
pub use reconcile::{build_station_index, city_groups};
pub use transfers::build_transfer_index;

/// Errors from reconciliation inputs.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
