//! Timetable assembly.
//!
//! Turns the merged feed set into the route-shaped tables the round-based
//! search consumes: per-route stop sequences and departure-sorted trip
//! lists, the reverse stop→routes index, and the expanded calendar.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::{classify, RouteId, RouteInfo, Stop, StopId, Trip};
use crate::feed::FeedSet;

use super::calendar::{self, CalendarIndex};
use super::repair::repair_stop_times;

/// The assembled timetable: everything the offline pipeline persists apart
/// from the reconciliation artifacts.
#[derive(Debug, Default)]
pub struct Timetable {
    pub stops: HashMap<StopId, Stop>,
    pub routes_info: HashMap<RouteId, RouteInfo>,
    /// Stop sequence of the longest observed trip on each route; carries
    /// every served stop.
    pub route_stops: HashMap<RouteId, Vec<StopId>>,
    /// Trips per route, sorted by first departure time.
    pub route_trips: HashMap<RouteId, Vec<Trip>>,
    pub routes_by_stop: HashMap<StopId, Vec<RouteId>>,
    pub calendar: CalendarIndex,
}

/// Assemble the timetable from the merged feeds.
pub fn build(feeds: &FeedSet) -> Timetable {
    let calendar = calendar::expand(&feeds.services);

    let mut route_trips: HashMap<RouteId, Vec<Trip>> = HashMap::new();
    let mut dropped = 0usize;

    for raw in &feeds.trips {
        // Stop times referencing stops absent from the stop table are
        // malformed rows.
        let mut stop_times: Vec<_> = raw
            .stop_times
            .iter()
            .filter(|(_, st)| feeds.stops.contains_key(&st.stop_id))
            .cloned()
            .collect();
        stop_times.sort_by_key(|(seq, _)| *seq);

        let repaired = repair_stop_times(stop_times);
        let Some(first) = repaired.first() else {
            dropped += 1;
            debug!(trip = %raw.trip_id, "dropping trip with no usable stop times");
            continue;
        };

        let first_departure_time = first.departure_time;
        let train_type = classify(
            &raw.operator,
            platform_token(first.stop_id.local()),
            raw.trip_id.local(),
            &raw.route_short_name,
        );

        route_trips.entry(raw.route_id.clone()).or_default().push(Trip {
            trip_id: raw.trip_id.clone(),
            service_id: raw.service_id.clone(),
            operator: raw.operator.clone(),
            train_type,
            first_departure_time,
            stop_times: repaired,
        });
    }

    for trips in route_trips.values_mut() {
        trips.sort_by(|a, b| {
            a.first_departure_time
                .cmp(&b.first_departure_time)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
        });
    }

    // The feed's route is authoritative; the route's stop sequence is the
    // longest one observed among its trips.
    let mut route_stops: HashMap<RouteId, Vec<StopId>> = HashMap::new();
    for (route_id, trips) in &route_trips {
        if let Some(longest) = trips.iter().max_by_key(|t| t.stop_times.len()) {
            route_stops.insert(
                route_id.clone(),
                longest.stop_times.iter().map(|st| st.stop_id.clone()).collect(),
            );
        }
    }

    let mut routes_by_stop: HashMap<StopId, Vec<RouteId>> = HashMap::new();
    for (route_id, stops) in &route_stops {
        for stop_id in stops {
            let routes = routes_by_stop.entry(stop_id.clone()).or_default();
            if !routes.contains(route_id) {
                routes.push(route_id.clone());
            }
        }
    }
    for routes in routes_by_stop.values_mut() {
        routes.sort();
    }

    // Routes that lost every trip carry no schedule; drop their metadata.
    let routes_info: HashMap<RouteId, RouteInfo> = feeds
        .routes
        .iter()
        .filter(|(id, _)| route_trips.contains_key(*id))
        .map(|(id, info)| (id.clone(), info.clone()))
        .collect();

    info!(
        routes = routes_info.len(),
        trips = route_trips.values().map(Vec::len).sum::<usize>(),
        stops = feeds.stops.len(),
        dates = calendar.len(),
        dropped_trips = dropped,
        "timetable assembled"
    );

    Timetable {
        stops: feeds.stops.clone(),
        routes_info,
        route_stops,
        route_trips,
        routes_by_stop,
        calendar,
    }
}

/// Product token embedded in an SNCF stop-point identifier, between the
/// `OCE` marker and the `-` that precedes the numeric code
/// (`StopPoint:OCETrain TER-87391003` → `Train TER`).
fn platform_token(stop_local_id: &str) -> Option<&str> {
    let start = stop_local_id.find("OCE")? + 3;
    let rest = &stop_local_id[start..];
    let end = rest.find('-')?;
    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayTime, ServiceId, StopTime, TrainType, TripId};
    use crate::feed::RawTrip;

    fn stop(id: &str, name: &str, op: &str) -> (StopId, Stop) {
        (
            StopId::from_raw(id),
            Stop {
                name: name.into(),
                lat: 0.0,
                lon: 0.0,
                operator: op.into(),
            },
        )
    }

    fn st(stop: &str, h: i32, m: i32) -> StopTime {
        let t = DayTime::from_hm(h, m);
        StopTime {
            stop_id: StopId::from_raw(stop),
            arrival_time: t,
            departure_time: t,
        }
    }

    fn raw_trip(id: &str, route: &str, short: &str, stops: Vec<StopTime>) -> RawTrip {
        RawTrip {
            trip_id: TripId::from_raw(id),
            route_id: RouteId::from_raw(route),
            service_id: ServiceId::from_raw("SNCF:s1"),
            operator: "SNCF".into(),
            route_short_name: short.into(),
            stop_times: stops.into_iter().enumerate().map(|(i, s)| (i as u32, s)).collect(),
        }
    }

    fn feed_with(trips: Vec<RawTrip>, stops: Vec<(StopId, Stop)>) -> FeedSet {
        let mut feeds = FeedSet::default();
        for t in &trips {
            feeds.routes.insert(
                t.route_id.clone(),
                RouteInfo {
                    short: t.route_short_name.clone(),
                    long: String::new(),
                    route_type: 2,
                    operator: "SNCF".into(),
                },
            );
        }
        feeds.trips = trips;
        feeds.stops = stops.into_iter().collect();
        feeds
    }

    #[test]
    fn route_stops_is_longest_trip() {
        let feeds = feed_with(
            vec![
                raw_trip(
                    "SNCF:t1",
                    "SNCF:r1",
                    "TER",
                    vec![st("SNCF:a", 8, 0), st("SNCF:c", 9, 0)],
                ),
                raw_trip(
                    "SNCF:t2",
                    "SNCF:r1",
                    "TER",
                    vec![st("SNCF:a", 10, 0), st("SNCF:b", 10, 30), st("SNCF:c", 11, 0)],
                ),
            ],
            vec![
                stop("SNCF:a", "A", "SNCF"),
                stop("SNCF:b", "B", "SNCF"),
                stop("SNCF:c", "C", "SNCF"),
            ],
        );

        let tt = build(&feeds);

        assert_eq!(
            tt.route_stops[&RouteId::from_raw("SNCF:r1")],
            vec![
                StopId::from_raw("SNCF:a"),
                StopId::from_raw("SNCF:b"),
                StopId::from_raw("SNCF:c"),
            ]
        );
    }

    #[test]
    fn route_trips_sorted_by_first_departure() {
        let feeds = feed_with(
            vec![
                raw_trip("SNCF:late", "SNCF:r1", "TER", vec![st("SNCF:a", 12, 0)]),
                raw_trip("SNCF:early", "SNCF:r1", "TER", vec![st("SNCF:a", 6, 0)]),
            ],
            vec![stop("SNCF:a", "A", "SNCF")],
        );

        let tt = build(&feeds);
        let trips = &tt.route_trips[&RouteId::from_raw("SNCF:r1")];
        assert_eq!(trips[0].trip_id, TripId::from_raw("SNCF:early"));
        assert_eq!(trips[1].trip_id, TripId::from_raw("SNCF:late"));
    }

    #[test]
    fn routes_by_stop_matches_route_stops() {
        let feeds = feed_with(
            vec![raw_trip(
                "SNCF:t1",
                "SNCF:r1",
                "TER",
                vec![st("SNCF:a", 8, 0), st("SNCF:b", 9, 0)],
            )],
            vec![stop("SNCF:a", "A", "SNCF"), stop("SNCF:b", "B", "SNCF")],
        );

        let tt = build(&feeds);

        // routesByStop[s] contains r iff s ∈ routeStops[r]
        for (route_id, stops) in &tt.route_stops {
            for stop_id in stops {
                assert!(tt.routes_by_stop[stop_id].contains(route_id));
            }
        }
        for (stop_id, routes) in &tt.routes_by_stop {
            for route_id in routes {
                assert!(tt.route_stops[route_id].contains(stop_id));
            }
        }
        // Every route carrying trips has metadata
        for route_id in tt.route_trips.keys() {
            assert!(tt.routes_info.contains_key(route_id));
        }
    }

    #[test]
    fn unknown_stops_are_dropped_from_trips() {
        let feeds = feed_with(
            vec![raw_trip(
                "SNCF:t1",
                "SNCF:r1",
                "TER",
                vec![st("SNCF:a", 8, 0), st("SNCF:ghost", 8, 30), st("SNCF:b", 9, 0)],
            )],
            vec![stop("SNCF:a", "A", "SNCF"), stop("SNCF:b", "B", "SNCF")],
        );

        let tt = build(&feeds);
        let trips = &tt.route_trips[&RouteId::from_raw("SNCF:r1")];
        assert_eq!(trips[0].stop_times.len(), 2);
        // Every referenced stop exists in the stop table
        for trip in trips {
            for st in &trip.stop_times {
                assert!(tt.stops.contains_key(&st.stop_id));
            }
        }
    }

    #[test]
    fn trips_are_labeled_with_a_product() {
        let feeds = feed_with(
            vec![raw_trip(
                "SNCF:t1",
                "SNCF:r1",
                "TER",
                vec![st("SNCF:StopPoint:OCETrain TER-87391003", 8, 0)],
            )],
            vec![stop("SNCF:StopPoint:OCETrain TER-87391003", "X", "SNCF")],
        );

        let tt = build(&feeds);
        let trips = &tt.route_trips[&RouteId::from_raw("SNCF:r1")];
        assert_eq!(trips[0].train_type, TrainType::Ter);
    }

    #[test]
    fn platform_token_extraction() {
        assert_eq!(
            platform_token("StopPoint:OCETrain TER-87391003"),
            Some("Train TER")
        );
        assert_eq!(
            platform_token("StopPoint:OCETGV INOUI-87686006"),
            Some("TGV INOUI")
        );
        assert_eq!(platform_token("S01700"), None);
        assert_eq!(platform_token("StopPoint:OCE-87123456"), None);
    }
}
