//! Persisted artifacts.
//!
//! The offline pipeline writes one JSON document per table into a single
//! directory; the query engine loads them read-only at startup. Times are
//! integer seconds from midnight and may exceed 86 400.
//!
//! `transfer_index.json` is heterogeneous: a sibling entry is either a bare
//! stop-id string (a same-station link whose same/cross-operator category
//! is derived from prefix equality at load time) or a tagged
//! `{ "id": …, "interCity": true }` object.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    RouteId, RouteInfo, Station, Stop, StopId, TransferEdge, TransferIndex, TransferKind, Trip,
};

use super::builder::Timetable;
use super::calendar::CalendarIndex;

/// Errors around artifact persistence. A missing artifact is fatal for the
/// engine, which cannot serve without its tables.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("missing artifact {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Build metadata, persisted as `meta.json` and served at `/api/meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub built_at: String,
    pub operators: Vec<String>,
    pub stops: usize,
    pub routes: usize,
    pub trips: usize,
    pub dates: usize,
}

/// Everything the query engine loads at startup.
#[derive(Debug)]
pub struct Artifacts {
    pub stops: HashMap<StopId, Stop>,
    pub routes_info: HashMap<RouteId, RouteInfo>,
    pub route_stops: HashMap<RouteId, Vec<StopId>>,
    pub route_trips: HashMap<RouteId, Vec<Trip>>,
    pub routes_by_stop: HashMap<StopId, Vec<RouteId>>,
    pub calendar: CalendarIndex,
    pub transfers: TransferIndex,
    pub stations: Vec<Station>,
    pub meta: Meta,
}

/// One entry of the persisted transfer index.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum TransferEntry {
    InterCity {
        id: StopId,
        #[serde(rename = "interCity")]
        inter_city: bool,
    },
    Sibling(StopId),
}

/// Write the timetable tables.
pub fn save_timetable(dir: &Path, timetable: &Timetable) -> Result<(), ArtifactError> {
    write_json(&dir.join("stops.json"), &timetable.stops)?;
    write_json(&dir.join("routes_info.json"), &timetable.routes_info)?;
    write_json(&dir.join("routes_by_stop.json"), &timetable.routes_by_stop)?;
    write_json(&dir.join("route_stops.json"), &timetable.route_stops)?;
    write_json(&dir.join("route_trips.json"), &timetable.route_trips)?;
    write_json(&dir.join("calendar_index.json"), &timetable.calendar)?;
    Ok(())
}

/// Write the transfer index in its heterogeneous persisted form.
pub fn save_transfers(dir: &Path, transfers: &TransferIndex) -> Result<(), ArtifactError> {
    let persisted: HashMap<&StopId, Vec<TransferEntry>> = transfers
        .iter()
        .map(|(stop, edges)| {
            let entries = edges
                .iter()
                .map(|edge| match edge.kind {
                    TransferKind::InterCitySameMetro => TransferEntry::InterCity {
                        id: edge.to.clone(),
                        inter_city: true,
                    },
                    _ => TransferEntry::Sibling(edge.to.clone()),
                })
                .collect();
            (stop, entries)
        })
        .collect();
    write_json(&dir.join("transfer_index.json"), &persisted)
}

/// Write the station index.
pub fn save_stations(dir: &Path, stations: &[Station]) -> Result<(), ArtifactError> {
    write_json(&dir.join("stations.json"), &stations)
}

/// Write the build metadata.
pub fn save_meta(dir: &Path, meta: &Meta) -> Result<(), ArtifactError> {
    write_json(&dir.join("meta.json"), meta)
}

/// Load every artifact from `dir`. Any missing file is fatal.
pub fn load(dir: &Path) -> Result<Artifacts, ArtifactError> {
    let stops: HashMap<StopId, Stop> = read_json(&dir.join("stops.json"))?;
    let routes_info = read_json(&dir.join("routes_info.json"))?;
    let route_stops = read_json(&dir.join("route_stops.json"))?;
    let route_trips = read_json(&dir.join("route_trips.json"))?;
    let routes_by_stop = read_json(&dir.join("routes_by_stop.json"))?;
    let calendar = read_json(&dir.join("calendar_index.json"))?;
    let stations: Vec<Station> = read_json(&dir.join("stations.json"))?;
    let meta: Meta = read_json(&dir.join("meta.json"))?;

    let persisted: HashMap<StopId, Vec<TransferEntry>> =
        read_json(&dir.join("transfer_index.json"))?;
    let transfers = normalize_transfers(persisted);

    info!(
        stops = stops.len(),
        stations = stations.len(),
        built_at = %meta.built_at,
        "artifacts loaded"
    );

    Ok(Artifacts {
        stops,
        routes_info,
        route_stops,
        route_trips,
        routes_by_stop,
        calendar,
        transfers,
        stations,
        meta,
    })
}

/// Lift the heterogeneous persisted entries into uniform edges. Bare
/// strings default their category from operator-prefix equality of the two
/// endpoints.
fn normalize_transfers(persisted: HashMap<StopId, Vec<TransferEntry>>) -> TransferIndex {
    persisted
        .into_iter()
        .map(|(stop, entries)| {
            let edges = entries
                .into_iter()
                .map(|entry| match entry {
                    TransferEntry::InterCity { id, inter_city: true } => TransferEdge {
                        to: id,
                        kind: TransferKind::InterCitySameMetro,
                    },
                    TransferEntry::InterCity { id, inter_city: false }
                    | TransferEntry::Sibling(id) => {
                        let kind = if id.operator() == stop.operator() {
                            TransferKind::SameStationSameOperator
                        } else {
                            TransferKind::SameStationCrossOperator
                        };
                        TransferEdge { to: id, kind }
                    }
                })
                .collect();
            (stop, edges)
        })
        .collect()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::Missing {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}
