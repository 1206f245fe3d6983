//! Stop points.

use serde::{Deserialize, Serialize};

/// One stop point: a platform identifier from one operator's feed.
///
/// Immutable after ingestion. The logical grouping of stop points into
/// stations is a separate concern (see [`crate::domain::Station`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub operator: String,
}

/// Great-circle distance between two coordinates, in metres.
///
/// Plain haversine on a spherical Earth; accurate to well under a metre at
/// the station-pairing scale.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
