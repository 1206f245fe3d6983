//! The in-memory timetable snapshot.
//!
//! Everything the query engine derives from the persisted artifacts at
//! startup, shared read-only across requests. The only mutable piece is
//! the small per-date cache of date-filtered `stop_to_trips` indexes,
//! guarded by a plain mutex: entries are large and insertions rare, so a
//! process-wide lock is the cheapest correct design.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{
    CityKey, RouteId, RouteInfo, Station, Stop, StopId, TransferIndex, Trip,
};
use crate::timetable::{Artifacts, CalendarIndex, Meta};

/// Maximum number of date-filtered indexes kept alive; eviction is
/// oldest-inserted.
const DATE_CACHE_CAPACITY: usize = 7;

/// One boardable entry at a stop: a trip of a route, and the position of
/// this stop within the trip.
#[derive(Debug, Clone)]
pub struct TripAtStop {
    pub route_id: RouteId,
    pub trip: Arc<Trip>,
    pub idx: usize,
}

/// Stop → boardable trips, in build-time insertion order (which breaks
/// ties between equal arrivals within a round).
pub type StopToTrips = HashMap<StopId, Vec<TripAtStop>>;

/// The immutable engine state built once at startup.
pub struct TimetableSnapshot {
    pub stops: HashMap<StopId, Stop>,
    pub routes_info: HashMap<RouteId, RouteInfo>,
    pub route_stops: HashMap<RouteId, Vec<StopId>>,
    pub route_trips: HashMap<RouteId, Vec<Arc<Trip>>>,
    pub routes_by_stop: HashMap<StopId, Vec<RouteId>>,
    pub calendar: CalendarIndex,
    pub transfers: TransferIndex,
    pub stations: Vec<Station>,
    /// Stop → index into `stations`.
    pub station_by_stop: HashMap<StopId, usize>,
    /// `(city, country)` → station indices, for keys with ≥ 2 stations.
    pub city_groups: HashMap<CityKey, Vec<usize>>,
    /// Canonical display names: the reconciled station name where one
    /// exists, the feed name otherwise.
    pub stop_names: HashMap<StopId, String>,
    pub meta: Meta,

    /// Boardable-trip index over the full, date-unfiltered timetable.
    all_trips: Arc<StopToTrips>,
    /// Date-filtered variants of `all_trips`, oldest-inserted eviction.
    date_cache: Mutex<VecDeque<(NaiveDate, Arc<StopToTrips>)>>,
}

impl TimetableSnapshot {
    /// Build the snapshot and its derived indexes from loaded artifacts.
    pub fn new(artifacts: Artifacts) -> Self {
        let route_trips: HashMap<RouteId, Vec<Arc<Trip>>> = artifacts
            .route_trips
            .into_iter()
            .map(|(route_id, trips)| (route_id, trips.into_iter().map(Arc::new).collect()))
            .collect();

        let all_trips = Arc::new(build_stop_to_trips(&route_trips, None));

        let mut station_by_stop = HashMap::new();
        for (idx, station) in artifacts.stations.iter().enumerate() {
            for member in &station.member_stop_ids {
                station_by_stop.insert(member.clone(), idx);
            }
        }

        let city_groups = crate::stations::city_groups(&artifacts.stations);

        let mut stop_names: HashMap<StopId, String> = artifacts
            .stops
            .iter()
            .map(|(id, stop)| (id.clone(), stop.name.clone()))
            .collect();
        for (stop_id, &idx) in &station_by_stop {
            if stop_names.contains_key(stop_id) {
                stop_names.insert(stop_id.clone(), artifacts.stations[idx].display_name.clone());
            }
        }

        info!(
            stops = artifacts.stops.len(),
            stations = artifacts.stations.len(),
            cities = city_groups.len(),
            boardable_stops = all_trips.len(),
            "timetable snapshot ready"
        );

        Self {
            stops: artifacts.stops,
            routes_info: artifacts.routes_info,
            route_stops: artifacts.route_stops,
            route_trips,
            routes_by_stop: artifacts.routes_by_stop,
            calendar: artifacts.calendar,
            transfers: artifacts.transfers,
            stations: artifacts.stations,
            station_by_stop,
            city_groups,
            stop_names,
            meta: artifacts.meta,
            all_trips,
            date_cache: Mutex::new(VecDeque::new()),
        }
    }

    /// The boardable-trip index for a query date: the unfiltered index for
    /// dateless queries, otherwise a cached (or freshly built) index over
    /// the services active on that date.
    pub fn trips_for_date(&self, date: Option<NaiveDate>) -> Arc<StopToTrips> {
        let Some(date) = date else {
            return Arc::clone(&self.all_trips);
        };

        {
            let cache = self.date_cache.lock().expect("date cache poisoned");
            if let Some((_, index)) = cache.iter().find(|(d, _)| *d == date) {
                return Arc::clone(index);
            }
        }

        debug!(%date, "building date-filtered trip index");
        let empty = std::collections::BTreeSet::new();
        let active = self.calendar.get(&date).unwrap_or(&empty);
        let index = Arc::new(build_stop_to_trips(&self.route_trips, Some(active)));

        let mut cache = self.date_cache.lock().expect("date cache poisoned");
        // Another request may have raced us here; the duplicate is
        // harmless and the lookup takes whichever landed first.
        if cache.len() >= DATE_CACHE_CAPACITY {
            cache.pop_front();
        }
        cache.push_back((date, Arc::clone(&index)));
        index
    }

    /// City key of the station a stop belongs to.
    pub fn city_of_stop(&self, stop: &StopId) -> Option<CityKey> {
        self.station_by_stop
            .get(stop)
            .map(|&idx| self.stations[idx].city_key())
    }

    /// Number of date-filtered indexes currently cached.
    #[cfg(test)]
    pub fn cached_dates(&self) -> usize {
        self.date_cache.lock().expect("date cache poisoned").len()
    }
}

/// Build the stop → boardable-trips index, optionally restricted to an
/// active-service set. Routes are walked in sorted order and trips in
/// their build order so the index is deterministic.
fn build_stop_to_trips(
    route_trips: &HashMap<RouteId, Vec<Arc<Trip>>>,
    active_services: Option<&std::collections::BTreeSet<crate::domain::ServiceId>>,
) -> StopToTrips {
    let mut route_ids: Vec<&RouteId> = route_trips.keys().collect();
    route_ids.sort();

    let mut index = StopToTrips::new();
    for route_id in route_ids {
        for trip in &route_trips[route_id] {
            if let Some(active) = active_services {
                if !active.contains(&trip.service_id) {
                    continue;
                }
            }
            for (idx, stop_time) in trip.stop_times.iter().enumerate() {
                index
                    .entry(stop_time.stop_id.clone())
                    .or_default()
                    .push(TripAtStop {
                        route_id: route_id.clone(),
                        trip: Arc::clone(trip),
                        idx,
                    });
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayTime, ServiceId, StopTime, TrainType, TripId};
    use crate::timetable::Meta;
    use std::collections::BTreeSet;

    fn sid(s: &str) -> StopId {
        StopId::from_raw(s)
    }

    fn trip(id: &str, service: &str, stops: &[(&str, i32)]) -> Trip {
        Trip {
            trip_id: TripId::from_raw(id),
            service_id: ServiceId::from_raw(service),
            operator: "SNCF".into(),
            train_type: TrainType::Inoui,
            first_departure_time: DayTime::from_hm(stops[0].1, 0),
            stop_times: stops
                .iter()
                .map(|(stop, hour)| StopTime {
                    stop_id: sid(stop),
                    arrival_time: DayTime::from_hm(*hour, 0),
                    departure_time: DayTime::from_hm(*hour, 0),
                })
                .collect(),
        }
    }

    fn snapshot_with(trips: Vec<Trip>, dates: Vec<(NaiveDate, Vec<&str>)>) -> TimetableSnapshot {
        let mut route_trips = HashMap::new();
        route_trips.insert(RouteId::from_raw("SNCF:r1"), trips);
        let mut calendar = CalendarIndex::new();
        for (date, services) in dates {
            calendar.insert(
                date,
                services.into_iter().map(ServiceId::from_raw).collect(),
            );
        }
        TimetableSnapshot::new(Artifacts {
            stops: HashMap::new(),
            routes_info: HashMap::new(),
            route_stops: HashMap::new(),
            route_trips,
            routes_by_stop: HashMap::new(),
            calendar,
            transfers: TransferIndex::new(),
            stations: Vec::new(),
            meta: Meta {
                built_at: String::new(),
                operators: Vec::new(),
                stops: 0,
                routes: 0,
                trips: 0,
                dates: 0,
            },
        })
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stop_to_trips_indexes_every_position() {
        let snapshot = snapshot_with(
            vec![trip("SNCF:t1", "SNCF:s1", &[("SNCF:a", 7), ("SNCF:b", 8), ("SNCF:c", 9)])],
            vec![],
        );
        let index = snapshot.trips_for_date(None);

        assert_eq!(index[&sid("SNCF:a")][0].idx, 0);
        assert_eq!(index[&sid("SNCF:b")][0].idx, 1);
        assert_eq!(index[&sid("SNCF:c")][0].idx, 2);
    }

    #[test]
    fn date_filter_drops_inactive_services() {
        let d = date(2025, 1, 10);
        let snapshot = snapshot_with(
            vec![
                trip("SNCF:active", "SNCF:s1", &[("SNCF:a", 7)]),
                trip("SNCF:inactive", "SNCF:s2", &[("SNCF:a", 8)]),
            ],
            vec![(d, vec!["SNCF:s1"])],
        );

        let index = snapshot.trips_for_date(Some(d));
        let at_a = &index[&sid("SNCF:a")];
        assert_eq!(at_a.len(), 1);
        assert_eq!(at_a[0].trip.trip_id, TripId::from_raw("SNCF:active"));
    }

    #[test]
    fn unknown_date_yields_empty_index() {
        let snapshot = snapshot_with(
            vec![trip("SNCF:t1", "SNCF:s1", &[("SNCF:a", 7)])],
            vec![(date(2025, 1, 10), vec!["SNCF:s1"])],
        );
        let index = snapshot.trips_for_date(Some(date(2030, 1, 1)));
        assert!(index.is_empty());
    }

    #[test]
    fn date_cache_holds_at_most_seven_entries() {
        let mut dates = Vec::new();
        for day in 1..=10 {
            dates.push((date(2025, 3, day), vec!["SNCF:s1"]));
        }
        let snapshot = snapshot_with(
            vec![trip("SNCF:t1", "SNCF:s1", &[("SNCF:a", 7)])],
            dates,
        );

        for day in 1..=10 {
            snapshot.trips_for_date(Some(date(2025, 3, day)));
        }
        assert_eq!(snapshot.cached_dates(), 7);

        // Oldest-inserted entries were evicted; recent ones remain cached.
        let before = snapshot.cached_dates();
        snapshot.trips_for_date(Some(date(2025, 3, 10)));
        assert_eq!(snapshot.cached_dates(), before);
    }

    #[test]
    fn dateless_queries_share_the_unfiltered_index() {
        let snapshot = snapshot_with(
            vec![trip("SNCF:t1", "SNCF:s1", &[("SNCF:a", 7)])],
            vec![],
        );
        let a = snapshot.trips_for_date(None);
        let b = snapshot.trips_for_date(None);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(snapshot.cached_dates(), 0);
    }

    #[test]
    fn build_index_is_deterministic_across_routes() {
        let mut route_trips: HashMap<RouteId, Vec<Arc<Trip>>> = HashMap::new();
        route_trips.insert(
            RouteId::from_raw("SNCF:r2"),
            vec![Arc::new(trip("SNCF:t2", "SNCF:s", &[("SNCF:a", 9)]))],
        );
        route_trips.insert(
            RouteId::from_raw("SNCF:r1"),
            vec![Arc::new(trip("SNCF:t1", "SNCF:s", &[("SNCF:a", 7)]))],
        );

        let index = build_stop_to_trips(&route_trips, None);
        let entries = &index[&sid("SNCF:a")];
        // Route ids are walked sorted, so r1's trip is inserted first.
        assert_eq!(entries[0].trip.trip_id, TripId::from_raw("SNCF:t1"));
        assert_eq!(entries[1].trip.trip_id, TripId::from_raw("SNCF:t2"));
    }

    #[test]
    fn inactive_filter_with_empty_set() {
        let mut route_trips: HashMap<RouteId, Vec<Arc<Trip>>> = HashMap::new();
        route_trips.insert(
            RouteId::from_raw("SNCF:r1"),
            vec![Arc::new(trip("SNCF:t1", "SNCF:s", &[("SNCF:a", 7)]))],
        );
        let empty = BTreeSet::new();
        let index = build_stop_to_trips(&route_trips, Some(&empty));
        assert!(index.is_empty());
    }
}
