//! Trips and stop times.

use serde::{Deserialize, Serialize};

use super::id::{ServiceId, StopId, TripId};
use super::time::DayTime;
use super::train_type::TrainType;

/// Arrival and departure at one stop of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTime {
    pub stop_id: StopId,
    pub arrival_time: DayTime,
    pub departure_time: DayTime,
}

/// One scheduled service instance along a fixed ordered stop sequence.
///
/// Invariant (post-repair): `stop_times` is non-empty and its times are
/// non-decreasing along the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub trip_id: TripId,
    pub service_id: ServiceId,
    pub operator: String,
    pub train_type: TrainType,
    pub first_departure_time: DayTime,
    pub stop_times: Vec<StopTime>,
}

impl Trip {
    /// Position of a stop within this trip, if served.
    pub fn position_of(&self, stop: &StopId) -> Option<usize> {
        self.stop_times.iter().position(|st| &st.stop_id == stop)
    }
}

/// Descriptive route attributes carried through from the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub short: String,
    pub long: String,
    #[serde(rename = "type")]
    pub route_type: i32,
    pub operator: String,
}
