//! Journeys and legs produced by the query engine.

use std::collections::BTreeSet;

use serde::Serialize;

use super::id::{RouteId, StopId, TripId};
use super::time::DayTime;
use super::train_type::TrainType;

/// One boarded trip within a journey: board at `from`, alight at `to`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub from_id: StopId,
    pub to_id: StopId,
    pub dep_time: DayTime,
    pub arr_time: DayTime,
    pub trip_id: TripId,
    pub route_id: RouteId,
    pub operator: String,
    pub train_type: TrainType,
    pub route_name: String,
    /// Riding time of this leg, in seconds.
    pub duration: i32,
}

/// A complete journey: one or more legs joined by transfers.
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    legs: Vec<Leg>,
    /// True when the journey begins with an inter-city walk from the
    /// requested origin to the first boarding stop. Such a walk counts as
    /// one transfer even though it precedes the first leg.
    initial_transfer: bool,
}

impl Journey {
    /// Assemble a journey. Returns `None` for an empty leg list: a journey
    /// with no boarded trip is not a journey.
    pub fn new(legs: Vec<Leg>, initial_transfer: bool) -> Option<Self> {
        if legs.is_empty() {
            return None;
        }
        Some(Self {
            legs,
            initial_transfer,
        })
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Departure time of the first boarded trip.
    pub fn departure_time(&self) -> DayTime {
        self.legs[0].dep_time
    }

    /// Arrival time of the last boarded trip.
    pub fn arrival_time(&self) -> DayTime {
        self.legs[self.legs.len() - 1].arr_time
    }

    /// Stop where the last leg alights.
    pub fn arrival_stop(&self) -> &StopId {
        &self.legs[self.legs.len() - 1].to_id
    }

    /// End-to-end duration in seconds.
    pub fn duration_secs(&self) -> i32 {
        self.arrival_time() - self.departure_time()
    }

    /// Number of transfers: one fewer than the number of boarded trips,
    /// plus one for a leading inter-city walk.
    pub fn transfers(&self) -> usize {
        self.legs.len() - 1 + usize::from(self.initial_transfer)
    }

    /// The set of products used across the legs.
    pub fn train_types(&self) -> BTreeSet<TrainType> {
        self.legs.iter().map(|l| l.train_type).collect()
    }

    /// Identity of the journey for deduplication: the concatenated trip-id
    /// sequence.
    pub fn trip_key(&self) -> String {
        let mut key = String::new();
        for leg in &self.legs {
            if !key.is_empty() {
                key.push('|');
            }
            key.push_str(leg.trip_id.as_str());
        }
        key
    }
}
