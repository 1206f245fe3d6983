//! Curated station manifest.
//!
//! An offline-maintained CSV, derived from an open-data operator-mapping
//! table keyed by UIC codes, listing per logical station the operator-local
//! identifiers that belong together. The manifest both groups stops into
//! stations and overrides feed display names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::StopId;

use super::StationError;

/// One curated logical station.
#[derive(Debug, Clone)]
pub struct ManifestStation {
    pub uic: Option<String>,
    pub name: String,
    pub city: String,
    pub country: String,
    /// Prefixed member stop identifiers.
    pub members: Vec<StopId>,
    /// Eurostar slug (`paris_nord`), where the station is served by ES.
    pub eurostar_slug: Option<String>,
}

/// The loaded manifest.
#[derive(Debug, Clone, Default)]
pub struct StationManifest {
    pub stations: Vec<ManifestStation>,
}

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    #[serde(default)]
    uic: String,
    name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    sncf: String,
    #[serde(default)]
    ti: String,
    #[serde(default)]
    db: String,
    #[serde(default)]
    sncb: String,
    #[serde(default)]
    renfe: String,
    #[serde(default)]
    ouigo_es: String,
    #[serde(default)]
    es: String,
}

impl StationManifest {
    /// Load the manifest CSV. A missing file yields an empty manifest with
    /// a warning: reconciliation degrades to heuristics only.
    pub fn load(path: &Path) -> Result<Self, StationError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "station manifest missing, using empty manifest");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(StationError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let mut stations = Vec::new();
        for result in csv::Reader::from_reader(text.as_bytes()).deserialize() {
            let rec: ManifestRecord = match result {
                Ok(rec) => rec,
                Err(e) => {
                    warn!(error = %e, "skipping malformed manifest row");
                    continue;
                }
            };

            let mut members = Vec::new();
            for (operator, cell) in [
                ("SNCF", &rec.sncf),
                ("TI", &rec.ti),
                ("DB", &rec.db),
                ("SNCB", &rec.sncb),
                ("RENFE", &rec.renfe),
                ("OUIGO_ES", &rec.ouigo_es),
                ("ES", &rec.es),
            ] {
                // A cell may carry several feed-local ids.
                for id in cell.split('|').filter(|s| !s.is_empty()) {
                    members.push(StopId::new(operator, id));
                }
            }

            stations.push(ManifestStation {
                uic: (!rec.uic.is_empty()).then(|| rec.uic.clone()),
                name: rec.name,
                city: rec.city,
                country: rec.country,
                members,
                eurostar_slug: (!rec.es.is_empty()).then(|| rec.es.clone()),
            });
        }

        info!(stations = stations.len(), "station manifest loaded");
        Ok(Self { stations })
    }

    /// Display-name overrides: manifest names win over feed names for every
    /// member stop.
    pub fn name_overrides(&self) -> HashMap<StopId, String> {
        let mut overrides = HashMap::new();
        for station in &self.stations {
            for member in &station.members {
                overrides.insert(member.clone(), station.name.clone());
            }
        }
        overrides
    }
}
