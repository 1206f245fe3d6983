//! Process configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the persisted artifacts.
    pub data_dir: PathBuf,

    /// Listen address.
    pub addr: SocketAddr,

    /// Optional static front-end directory, served at the root.
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Read `RAIL_DATA_DIR`, `RAIL_ADDR` and `RAIL_STATIC_DIR`, with
    /// defaults suitable for local runs.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("RAIL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let addr = std::env::var("RAIL_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
        let static_dir = std::env::var("RAIL_STATIC_DIR").ok().map(PathBuf::from);
        Self {
            data_dir,
            addr,
            static_dir,
        }
    }
}

/// Offline pipeline configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Root directory with one schedule directory per operator.
    pub feeds_dir: PathBuf,

    /// Curated station manifest CSV.
    pub manifest_path: PathBuf,

    /// Output directory for the artifacts.
    pub out_dir: PathBuf,
}

impl IngestConfig {
    /// Read `RAIL_FEEDS_DIR`, `RAIL_MANIFEST` and `RAIL_DATA_DIR`.
    pub fn from_env() -> Self {
        let feeds_dir = std::env::var("RAIL_FEEDS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("feeds"));
        let manifest_path = std::env::var("RAIL_MANIFEST")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("station_manifest.csv"));
        let out_dir = std::env::var("RAIL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        Self {
            feeds_dir,
            manifest_path,
            out_dir,
        }
    }
}
