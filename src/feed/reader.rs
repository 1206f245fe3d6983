//! Per-operator schedule directory reader.
//!
//! One directory per operator under the feeds root; the directory name is
//! the operator code. Every identifier is prefixed `"<OP>:"` on the way
//! out, so the merged universe has no collisions. A missing file yields an
//! empty table with a warning; a malformed row is skipped.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::{DayTime, RouteId, RouteInfo, ServiceId, Stop, StopId, StopTime, TripId};

use super::records::{
    CalendarDateRecord, CalendarRecord, RouteRecord, StopRecord, StopTimeRecord, TransferRecord,
    TripRecord,
};
use super::FeedError;

/// GTFS route_type for buses; the planner models trains only.
const ROUTE_TYPE_BUS: i32 = 3;

/// A trip as read from the feed, before repair: stop times still carry
/// their sequence numbers and may be non-monotonic.
#[derive(Debug, Clone)]
pub struct RawTrip {
    pub trip_id: TripId,
    pub route_id: RouteId,
    pub service_id: ServiceId,
    pub operator: String,
    pub route_short_name: String,
    /// `(stop_sequence, stop_time)` pairs in file order.
    pub stop_times: Vec<(u32, StopTime)>,
}

/// Weekly calendar pattern plus date-level exceptions for one service.
#[derive(Debug, Clone, Default)]
pub struct ServicePattern {
    /// Monday-first active weekdays.
    pub weekdays: [bool; 7],
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub added: Vec<NaiveDate>,
    pub removed: Vec<NaiveDate>,
}

/// The merged output of reading every operator directory.
#[derive(Debug, Default)]
pub struct FeedSet {
    pub operators: Vec<String>,
    pub stops: HashMap<StopId, Stop>,
    /// Administrative parent area of a stop, where the feed provides one.
    pub parents: HashMap<StopId, StopId>,
    pub routes: HashMap<RouteId, RouteInfo>,
    pub trips: Vec<RawTrip>,
    pub services: HashMap<ServiceId, ServicePattern>,
    /// Stop pairs from the feeds' own transfer tables.
    pub transfer_pairs: Vec<(StopId, StopId)>,
}

/// Read every operator subdirectory under `root` and merge the results.
pub fn read_feeds(root: &Path) -> Result<FeedSet, FeedError> {
    let mut merged = FeedSet::default();

    let mut dirs: Vec<_> = fs::read_dir(root)
        .map_err(|source| FeedError::Io {
            path: root.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.path())
        .collect();
    dirs.sort();

    for dir in dirs {
        let operator = match dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let feed = read_operator(&dir, &operator)?;
        info!(
            %operator,
            stops = feed.stops.len(),
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            services = feed.services.len(),
            "read operator feed"
        );
        merged.operators.push(operator);
        merged.stops.extend(feed.stops);
        merged.parents.extend(feed.parents);
        merged.routes.extend(feed.routes);
        merged.trips.extend(feed.trips);
        merged.services.extend(feed.services);
        merged.transfer_pairs.extend(feed.transfer_pairs);
    }

    Ok(merged)
}

/// Read one operator's directory, applying its keep rules and prefixing
/// every identifier.
pub fn read_operator(dir: &Path, operator: &str) -> Result<FeedSet, FeedError> {
    let route_records: Vec<RouteRecord> = read_csv(&dir.join("routes.txt"))?;
    let trip_records: Vec<TripRecord> = read_csv(&dir.join("trips.txt"))?;
    let stop_time_records: Vec<StopTimeRecord> = read_csv(&dir.join("stop_times.txt"))?;
    let stop_records: Vec<StopRecord> = read_csv(&dir.join("stops.txt"))?;
    let calendar_records: Vec<CalendarRecord> = read_csv(&dir.join("calendar.txt"))?;
    let exception_records: Vec<CalendarDateRecord> = read_csv(&dir.join("calendar_dates.txt"))?;
    let transfer_records: Vec<TransferRecord> = read_csv(&dir.join("transfers.txt"))?;

    let mut feed = FeedSet {
        operators: vec![operator.to_string()],
        ..FeedSet::default()
    };

    // Routes, filtered by the operator's keep rule.
    let mut short_names: HashMap<RouteId, String> = HashMap::new();
    for rec in route_records {
        if !keep_route(operator, &rec) {
            continue;
        }
        let id = RouteId::new(operator, &rec.route_id);
        short_names.insert(id.clone(), rec.route_short_name.clone());
        feed.routes.insert(
            id,
            RouteInfo {
                short: rec.route_short_name,
                long: rec.route_long_name,
                route_type: rec.route_type,
                operator: operator.to_string(),
            },
        );
    }

    // Trips on kept routes.
    let mut trip_index: HashMap<TripId, usize> = HashMap::new();
    for rec in trip_records {
        let route_id = RouteId::new(operator, &rec.route_id);
        let Some(short) = short_names.get(&route_id) else {
            continue; // route was filtered out
        };
        let trip_id = TripId::new(operator, &rec.trip_id);
        trip_index.insert(trip_id.clone(), feed.trips.len());
        feed.trips.push(RawTrip {
            trip_id,
            route_id,
            service_id: ServiceId::new(operator, &rec.service_id),
            operator: operator.to_string(),
            route_short_name: short.clone(),
            stop_times: Vec::new(),
        });
    }

    // Stop times attached to surviving trips.
    for rec in stop_time_records {
        let trip_id = TripId::new(operator, &rec.trip_id);
        let Some(&idx) = trip_index.get(&trip_id) else {
            continue;
        };
        let (Ok(arrival), Ok(departure)) = (
            DayTime::parse(&rec.arrival_time),
            DayTime::parse(&rec.departure_time),
        ) else {
            debug!(trip = %trip_id, "skipping stop time with unparseable time");
            continue;
        };
        feed.trips[idx].stop_times.push((
            rec.stop_sequence,
            StopTime {
                stop_id: StopId::new(operator, &rec.stop_id),
                arrival_time: arrival,
                departure_time: departure,
            },
        ));
    }
    feed.trips.retain(|t| !t.stop_times.is_empty());

    // Stops.
    for rec in stop_records {
        let id = StopId::new(operator, &rec.stop_id);
        if !rec.parent_station.is_empty() {
            feed.parents
                .insert(id.clone(), StopId::new(operator, &rec.parent_station));
        }
        feed.stops.insert(
            id,
            Stop {
                name: rec.stop_name,
                lat: rec.stop_lat,
                lon: rec.stop_lon,
                operator: operator.to_string(),
            },
        );
    }

    // Weekly calendar and exceptions.
    for rec in calendar_records {
        let (Ok(start), Ok(end)) = (parse_date(&rec.start_date), parse_date(&rec.end_date)) else {
            debug!(service = %rec.service_id, "skipping calendar row with bad dates");
            continue;
        };
        feed.services.insert(
            ServiceId::new(operator, &rec.service_id),
            ServicePattern {
                weekdays: [
                    rec.monday == 1,
                    rec.tuesday == 1,
                    rec.wednesday == 1,
                    rec.thursday == 1,
                    rec.friday == 1,
                    rec.saturday == 1,
                    rec.sunday == 1,
                ],
                start: Some(start),
                end: Some(end),
                added: Vec::new(),
                removed: Vec::new(),
            },
        );
    }
    for rec in exception_records {
        let Ok(date) = parse_date(&rec.date) else {
            continue;
        };
        let service_id = ServiceId::new(operator, &rec.service_id);
        // Exception-only services have no weekly row; create one on demand.
        let pattern = feed.services.entry(service_id).or_default();
        match rec.exception_type {
            1 => pattern.added.push(date),
            2 => pattern.removed.push(date),
            other => debug!(exception_type = other, "unknown calendar exception type"),
        }
    }

    // The feed's own transfer table, used as a reconciliation whitelist.
    for rec in transfer_records {
        feed.transfer_pairs.push((
            StopId::new(operator, &rec.from_stop_id),
            StopId::new(operator, &rec.to_stop_id),
        ));
    }

    Ok(feed)
}

/// Per-operator trip selection: which trains this planner models.
fn keep_route(operator: &str, rec: &RouteRecord) -> bool {
    match operator {
        "SNCF" => {
            rec.route_type != ROUTE_TYPE_BUS
                && !matches!(
                    rec.route_short_name.as_str(),
                    "CAR" | "NAVETTE" | "TRAMTRAIN"
                )
        }
        "SNCB" => matches!(rec.route_short_name.as_str(), "IC" | "EC" | "NJ" | "OTC"),
        _ => rec.route_type != ROUTE_TYPE_BUS,
    }
}

/// `YYYYMMDD` feed date.
fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
}

/// Read one CSV file into typed records.
///
/// A missing file is an empty table (with a warning); an unreadable row is
/// skipped. The UTF-8 BOM some feeds carry on the header line is stripped
/// before parsing.
fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FeedError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "feed file missing, treating as empty");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(FeedError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in csv::Reader::from_reader(text.as_bytes()).deserialize() {
        match result {
            Ok(rec) => rows.push(rec),
            Err(e) => {
                skipped += 1;
                debug!(path = %path.display(), error = %e, "skipping malformed row");
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped malformed rows");
    }
    Ok(rows)
}
