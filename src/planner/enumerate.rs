//! Result enumeration, Pareto ordering, and explore mode.
//!
//! One invocation of the round core yields one best-effort set for a given
//! start time. A journey *sequence* comes from re-running with
//! successively later start times until the horizon is spanned or the
//! search runs dry, then ordering by `(transfers, duration, departure)`
//! and deduplicating arrivals per destination city.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, instrument};

use crate::domain::{CityKey, DayTime, Journey, StopId, TrainType};

use super::config::SearchConfig;
use super::reconstruct::reconstruct;
use super::search::{run_rounds, SearchContext};
use super::snapshot::TimetableSnapshot;

/// A journey query: origins to destinations, departing at or after
/// `start` on `date`.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub origins: Vec<StopId>,
    pub destinations: Vec<StopId>,
    pub start: DayTime,
    pub date: Option<NaiveDate>,
    /// Restrict every boarded trip to these products.
    pub allowed_types: Option<HashSet<TrainType>>,
}

/// Enumerate Pareto-ordered journeys for a request.
///
/// Unknown stop identifiers have been filtered by the caller; an empty
/// origin or destination set yields an empty result, never an error.
#[instrument(skip(snapshot, config, request), fields(
    origins = request.origins.len(),
    destinations = request.destinations.len(),
    start = %request.start,
))]
pub fn plan(
    snapshot: &TimetableSnapshot,
    config: &SearchConfig,
    request: &PlanRequest,
) -> Vec<Journey> {
    if request.origins.is_empty() || request.destinations.is_empty() {
        return Vec::new();
    }

    let stop_to_trips = snapshot.trips_for_date(request.date);
    let ctx = SearchContext {
        snapshot,
        stop_to_trips: &stop_to_trips,
        month: request.date.map(|d| d.month()),
        allowed_types: request.allowed_types.as_ref(),
    };

    let mut journeys: Vec<Journey> = Vec::new();
    let mut seen_trips: HashSet<String> = HashSet::new();
    let first_start = request.start;
    let mut start = request.start;
    let mut empty_advances = 0usize;

    loop {
        let state = run_rounds(&ctx, &request.origins, start, config);

        let mut new_journeys: Vec<Journey> = Vec::new();
        for destination in &request.destinations {
            if let Some(journey) = reconstruct(&state, snapshot, destination) {
                if seen_trips.insert(journey.trip_key()) {
                    new_journeys.push(journey);
                }
            }
        }

        let next_start = if new_journeys.is_empty() {
            empty_advances += 1;
            if empty_advances >= config.max_empty_advances {
                break;
            }
            start + config.restart_step_secs
        } else {
            empty_advances = 0;
            let latest_dep = new_journeys
                .iter()
                .map(Journey::departure_time)
                .max()
                .unwrap_or(start);
            journeys.extend(new_journeys);
            latest_dep + 1
        };

        if next_start - first_start > config.horizon_secs {
            break;
        }
        start = next_start;
    }

    debug!(found = journeys.len(), "enumeration complete");

    journeys.sort_by(|a, b| {
        a.transfers()
            .cmp(&b.transfers())
            .then_with(|| a.duration_secs().cmp(&b.duration_secs()))
            .then_with(|| a.departure_time().cmp(&b.departure_time()))
    });

    dedup_by_arrival_city(snapshot, journeys)
}

/// One physical departure must not appear once per arrival-side platform:
/// among journeys sharing a departure time and an arrival city, only the
/// shortest is kept.
fn dedup_by_arrival_city(snapshot: &TimetableSnapshot, journeys: Vec<Journey>) -> Vec<Journey> {
    let mut best: HashMap<(DayTime, CityKey), i32> = HashMap::new();
    for journey in &journeys {
        if let Some(city) = snapshot.city_of_stop(journey.arrival_stop()) {
            let key = (journey.departure_time(), city);
            let duration = journey.duration_secs();
            best.entry(key)
                .and_modify(|d| *d = (*d).min(duration))
                .or_insert(duration);
        }
    }

    let mut emitted: HashSet<(DayTime, CityKey)> = HashSet::new();
    journeys
        .into_iter()
        .filter(|journey| {
            let Some(city) = snapshot.city_of_stop(journey.arrival_stop()) else {
                return true; // stop outside the station index: keep as-is
            };
            let key = (journey.departure_time(), city);
            if best[&key] != journey.duration_secs() {
                return false;
            }
            emitted.insert(key.clone())
        })
        .collect()
}

/// A reachable stop found by explore mode, with its best journey.
#[derive(Debug)]
pub struct Reachable {
    pub stop: StopId,
    pub journey: Journey,
}

/// Explore mode: the fastest journey to every reachable stop, seeding a
/// grid of discrete start hours across the service day.
#[instrument(skip(snapshot, config, origins), fields(origins = origins.len()))]
pub fn explore(
    snapshot: &TimetableSnapshot,
    config: &SearchConfig,
    origins: &[StopId],
    date: Option<NaiveDate>,
) -> Vec<Reachable> {
    if origins.is_empty() {
        return Vec::new();
    }

    let stop_to_trips = snapshot.trips_for_date(date);
    let ctx = SearchContext {
        snapshot,
        stop_to_trips: &stop_to_trips,
        month: date.map(|d| d.month()),
        allowed_types: None,
    };

    let mut best: HashMap<StopId, Journey> = HashMap::new();
    for &hour in &config.explore_start_hours {
        let state = run_rounds(&ctx, origins, DayTime::from_hm(hour, 0), config);
        for stop in state.tau_best.keys() {
            if state.origins.contains(stop) {
                continue;
            }
            let Some(journey) = reconstruct(&state, snapshot, stop) else {
                continue;
            };
            match best.get(stop) {
                Some(existing) if existing.duration_secs() <= journey.duration_secs() => {}
                _ => {
                    best.insert(stop.clone(), journey);
                }
            }
        }
    }

    let mut reachable: Vec<Reachable> = best
        .into_iter()
        .map(|(stop, journey)| Reachable { stop, journey })
        .collect();
    reachable.sort_by(|a, b| a.stop.cmp(&b.stop));
    reachable
}
