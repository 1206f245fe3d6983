//! Request and response shapes of the JSON API.

use serde::{Deserialize, Serialize};

use crate::domain::{Journey, Leg, StopId};
use crate::planner::TimetableSnapshot;

// Requests

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub from: Option<String>,
    pub to: Option<String>,
    /// `HH:MM`; defaults to midnight.
    pub time: Option<String>,
    /// `YYYY-MM-DD`; dateless queries search the unfiltered timetable.
    pub date: Option<String>,
    /// Skip this many journeys in the final list.
    pub offset: Option<usize>,
    /// Only journeys departing strictly after `HH:MM`.
    pub after_dep: Option<String>,
    pub limit: Option<usize>,
    /// Discount-card profile used for tariff lookup.
    pub carte: Option<String>,
    /// Comma-separated product allow-set.
    pub train_types: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExploreParams {
    pub from: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DebugTripsParams {
    pub route: Option<String>,
    pub stop: Option<String>,
    pub date: Option<String>,
}

// Responses

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegView {
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub to_name: String,
    pub dep_time: String,
    pub arr_time: String,
    pub dep_seconds: i32,
    pub arr_seconds: i32,
    pub trip_id: String,
    pub route_id: String,
    pub operator: String,
    pub train_type: String,
    pub route_name: String,
    /// Minutes.
    pub duration: i32,
}

impl LegView {
    pub fn from_leg(leg: &Leg, snapshot: &TimetableSnapshot) -> Self {
        Self {
            from_id: leg.from_id.to_string(),
            from_name: stop_name(snapshot, &leg.from_id),
            to_id: leg.to_id.to_string(),
            to_name: stop_name(snapshot, &leg.to_id),
            dep_time: leg.dep_time.to_string(),
            arr_time: leg.arr_time.to_string(),
            dep_seconds: leg.dep_time.seconds(),
            arr_seconds: leg.arr_time.seconds(),
            trip_id: leg.trip_id.to_string(),
            route_id: leg.route_id.to_string(),
            operator: leg.operator.clone(),
            train_type: leg.train_type.to_string(),
            route_name: leg.route_name.clone(),
            duration: leg.duration / 60,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyView {
    pub dep_time: String,
    pub arr_time: String,
    pub dep_seconds: i32,
    pub arr_seconds: i32,
    /// Minutes.
    pub duration: i32,
    pub transfers: usize,
    pub train_types: Vec<String>,
    pub legs: Vec<LegView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl JourneyView {
    pub fn from_journey(journey: &Journey, snapshot: &TimetableSnapshot) -> Self {
        Self {
            dep_time: journey.departure_time().to_string(),
            arr_time: journey.arrival_time().to_string(),
            dep_seconds: journey.departure_time().seconds(),
            arr_seconds: journey.arrival_time().seconds(),
            duration: journey.duration_secs() / 60,
            transfers: journey.transfers(),
            train_types: journey
                .train_types()
                .into_iter()
                .map(|t| t.to_string())
                .collect(),
            legs: journey
                .legs()
                .iter()
                .map(|leg| LegView::from_leg(leg, snapshot))
                .collect(),
            price: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub journeys: Vec<JourneyView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachableView {
    pub stop_id: String,
    pub name: String,
    pub dep_time: String,
    pub arr_time: String,
    /// Minutes.
    pub duration: i32,
    pub transfers: usize,
}

#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    pub reachable: Vec<ReachableView>,
}

#[derive(Debug, Serialize)]
pub struct StopSuggestion {
    pub id: String,
    pub name: String,
    pub operator: String,
}

#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub stops: Vec<StopSuggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySuggestion {
    pub city: String,
    pub country: String,
    pub stations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CitiesResponse {
    pub cities: Vec<CitySuggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugTripView {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub operator: String,
    pub train_type: String,
    pub calls: Vec<DebugCallView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugCallView {
    pub stop_id: String,
    pub name: String,
    pub arr_time: String,
    pub dep_time: String,
}

#[derive(Debug, Serialize)]
pub struct DebugTripsResponse {
    pub trips: Vec<DebugTripView>,
}

fn stop_name(snapshot: &TimetableSnapshot, stop: &StopId) -> String {
    snapshot
        .stop_names
        .get(stop)
        .cloned()
        .unwrap_or_else(|| stop.to_string())
}
