//! Logical stations, city grouping, and transfer edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::StopId;

/// The transfer index: for each stop, the sibling stops reachable by
/// walking. Symmetry is not guaranteed by construction and must not be
/// assumed by consumers.
pub type TransferIndex = HashMap<StopId, Vec<TransferEdge>>;

/// Category of a walking transfer between two stop points.
///
/// The category is a property of the *link*, not of its endpoints, and
/// determines the minimum dwell applied when a journey crosses the edge.
/// Links are not guaranteed symmetric: each side classifies the edge from
/// its own end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferKind {
    /// Same physical station, same operator.
    SameStationSameOperator,
    /// Same physical station, different operator.
    SameStationCrossOperator,
    /// Different stations within the same metropolitan city.
    InterCitySameMetro,
}

impl TransferKind {
    /// Minimum dwell in seconds when a journey crosses an edge of this
    /// category.
    pub const fn min_dwell_secs(self) -> i32 {
        match self {
            Self::SameStationSameOperator => 3 * 60,
            Self::SameStationCrossOperator => 10 * 60,
            Self::InterCitySameMetro => 45 * 60,
        }
    }
}

/// One directed transfer edge out of a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEdge {
    pub to: StopId,
    pub kind: TransferKind,
}

/// City identity used for grouping stations and deduplicating arrivals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CityKey {
    pub city: String,
    pub country: String,
}

/// A logical station: the union of stop points that constitute one
/// physical place across operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub display_name: String,
    pub city: String,
    pub country: String,
    pub member_stop_ids: Vec<StopId>,
    pub operators: Vec<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Station {
    /// The `(city, country)` grouping key.
    pub fn city_key(&self) -> CityKey {
        CityKey {
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }
}
