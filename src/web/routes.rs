//! HTTP route handlers.

use std::collections::HashSet;
use std::path::Path;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use tower_http::services::ServeDir;
use tracing::warn;

use crate::domain::{DayTime, RouteId, StopId, TrainType};
use crate::planner::{explore, plan, PlanRequest};
use crate::stations::normalize_name;
use crate::tarifs::TarifQuery;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
///
/// `static_dir`, when present, is served at the root for the front-end.
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/search", get(search))
        .route("/api/explore", get(explore_handler))
        .route("/api/stops", get(suggest_stops))
        .route("/api/cities", get(suggest_cities))
        .route("/api/meta", get(meta))
        .route("/api/debug/trips", get(debug_trips))
        .route("/api/tarifs", post(tarifs));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };
    router.with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Journey search.
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let from = params
        .from
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("missing required parameter: from"))?;
    let to = params
        .to
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("missing required parameter: to"))?;

    let mut start = match params.time.as_deref() {
        Some(time) => DayTime::parse_hhmm(time)
            .map_err(|e| AppError::bad_request(format!("invalid time: {e}")))?,
        None => DayTime::from_seconds(0),
    };
    if let Some(after) = params.after_dep.as_deref() {
        let after = DayTime::parse_hhmm(after)
            .map_err(|e| AppError::bad_request(format!("invalid after_dep: {e}")))?;
        // Strictly after: nudge one second past the boundary.
        start = start.max(after + 1);
    }
    let date = parse_date(params.date.as_deref())?;
    let allowed_types = params.train_types.as_deref().map(parse_train_types);

    // Unknown identifiers are filtered silently; an all-unknown side just
    // produces an empty result.
    let origins = resolve_endpoint(&state, from);
    let destinations = resolve_endpoint(&state, to);

    let request = PlanRequest {
        origins,
        destinations,
        start,
        date,
        allowed_types,
    };
    let journeys = plan(&state.snapshot, &state.config, &request);

    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(usize::MAX);
    let profile = params.carte.clone().unwrap_or_else(|| "ADULTE".to_string());

    let journeys = journeys
        .iter()
        .skip(offset)
        .take(limit)
        .map(|journey| {
            let mut view = JourneyView::from_journey(journey, &state.snapshot);
            view.price = price_for(&state, journey, &profile);
            view
        })
        .collect();

    Ok(Json(SearchResponse { journeys }))
}

/// Reachable-set exploration.
async fn explore_handler(
    State(state): State<AppState>,
    Query(params): Query<ExploreParams>,
) -> Result<Json<ExploreResponse>, AppError> {
    let from = params
        .from
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("missing required parameter: from"))?;
    let date = parse_date(params.date.as_deref())?;

    let origins = resolve_endpoint(&state, from);
    let reachable = explore(&state.snapshot, &state.config, &origins, date);

    let reachable = reachable
        .iter()
        .map(|r| ReachableView {
            stop_id: r.stop.to_string(),
            name: state
                .snapshot
                .stop_names
                .get(&r.stop)
                .cloned()
                .unwrap_or_else(|| r.stop.to_string()),
            dep_time: r.journey.departure_time().to_string(),
            arr_time: r.journey.arrival_time().to_string(),
            duration: r.journey.duration_secs() / 60,
            transfers: r.journey.transfers(),
        })
        .collect();

    Ok(Json(ExploreResponse { reachable }))
}

/// Stop-name autocomplete.
async fn suggest_stops(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<StopsResponse>, AppError> {
    let q = params
        .q
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("missing required parameter: q"))?;
    let limit = params.limit.unwrap_or(10).min(50);
    let needle = normalize_name(q);

    let mut prefix_matches: Vec<StopSuggestion> = Vec::new();
    let mut substring_matches: Vec<StopSuggestion> = Vec::new();
    let mut names: Vec<(&StopId, &String)> = state.snapshot.stop_names.iter().collect();
    names.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));

    for (stop_id, name) in names {
        let normalized = normalize_name(name);
        let bucket = if normalized.starts_with(&needle) {
            &mut prefix_matches
        } else if normalized.contains(&needle) {
            &mut substring_matches
        } else {
            continue;
        };
        bucket.push(StopSuggestion {
            id: stop_id.to_string(),
            name: name.clone(),
            operator: stop_id.operator().to_string(),
        });
    }

    prefix_matches.extend(substring_matches);
    prefix_matches.truncate(limit);
    Ok(Json(StopsResponse {
        stops: prefix_matches,
    }))
}

/// City autocomplete over city groups.
async fn suggest_cities(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<CitiesResponse>, AppError> {
    let q = params
        .q
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("missing required parameter: q"))?;
    let limit = params.limit.unwrap_or(10).min(50);
    let needle = normalize_name(q);

    let mut cities: Vec<CitySuggestion> = state
        .snapshot
        .city_groups
        .iter()
        .filter(|(key, _)| normalize_name(&key.city).contains(&needle))
        .map(|(key, stations)| CitySuggestion {
            city: key.city.clone(),
            country: key.country.clone(),
            stations: stations
                .iter()
                .map(|&idx| state.snapshot.stations[idx].display_name.clone())
                .collect(),
        })
        .collect();
    cities.sort_by(|a, b| a.city.cmp(&b.city));
    cities.truncate(limit);

    Ok(Json(CitiesResponse { cities }))
}

/// Build metadata.
async fn meta(State(state): State<AppState>) -> Json<crate::timetable::Meta> {
    Json(state.snapshot.meta.clone())
}

/// Trip inspection, by route or by stop.
async fn debug_trips(
    State(state): State<AppState>,
    Query(params): Query<DebugTripsParams>,
) -> Result<Json<DebugTripsResponse>, AppError> {
    let date = parse_date(params.date.as_deref())?;
    let active = date.and_then(|d| state.snapshot.calendar.get(&d));

    let mut trips: Vec<DebugTripView> = Vec::new();

    if let Some(route) = params.route.as_deref() {
        let route_id = RouteId::from_raw(route);
        if let Some(route_trips) = state.snapshot.route_trips.get(&route_id) {
            for trip in route_trips {
                if active.is_some_and(|set| !set.contains(&trip.service_id)) {
                    continue;
                }
                trips.push(debug_view(&state, &route_id, trip));
            }
        }
    } else if let Some(stop) = params.stop.as_deref() {
        let stop_id = StopId::from_raw(stop);
        let index = state.snapshot.trips_for_date(date);
        if let Some(entries) = index.get(&stop_id) {
            for entry in entries {
                trips.push(debug_view(&state, &entry.route_id, &entry.trip));
            }
        }
    } else {
        return Err(AppError::bad_request("missing parameter: route or stop"));
    }

    Ok(Json(DebugTripsResponse { trips }))
}

/// Tariff lookup: a batch of exact product keys.
async fn tarifs(
    State(state): State<AppState>,
    Json(queries): Json<Vec<TarifQuery>>,
) -> Json<Vec<Option<f64>>> {
    let prices = queries.iter().map(|q| state.tarifs.lookup(q)).collect();
    Json(prices)
}

/// Resolve a comma-separated `from`/`to` value into stop identifiers:
/// exact stop ids, station names, or city names, in that order. Unknown
/// tokens are dropped.
fn resolve_endpoint(state: &AppState, raw: &str) -> Vec<StopId> {
    let snapshot = &state.snapshot;
    let mut resolved: Vec<StopId> = Vec::new();
    let mut seen: HashSet<StopId> = HashSet::new();

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let stop_id = StopId::from_raw(token);
        if snapshot.stops.contains_key(&stop_id) {
            if seen.insert(stop_id.clone()) {
                resolved.push(stop_id);
            }
            continue;
        }

        let needle = normalize_name(token);

        let station_members = snapshot
            .stations
            .iter()
            .find(|s| normalize_name(&s.display_name) == needle)
            .map(|s| s.member_stop_ids.clone());
        if let Some(members) = station_members {
            for member in members {
                if seen.insert(member.clone()) {
                    resolved.push(member);
                }
            }
            continue;
        }

        let city_stations = snapshot
            .city_groups
            .iter()
            .find(|(key, _)| normalize_name(&key.city) == needle)
            .map(|(_, stations)| stations.clone());
        if let Some(stations) = city_stations {
            for idx in stations {
                for member in &snapshot.stations[idx].member_stop_ids {
                    if seen.insert(member.clone()) {
                        resolved.push(member.clone());
                    }
                }
            }
            continue;
        }

        warn!(token, "unresolvable origin/destination token ignored");
    }

    resolved
}

/// Tariff attached to a search result: the journey's dominant product
/// between its endpoint stations, for the requested profile in 2nd class.
fn price_for(state: &AppState, journey: &crate::domain::Journey, profile: &str) -> Option<f64> {
    let legs = journey.legs();
    let first = legs.first()?;
    let last = legs.last()?;
    let origin = state.snapshot.stop_names.get(&first.from_id)?;
    let destination = state.snapshot.stop_names.get(&last.to_id)?;
    state.tarifs.lookup(&TarifQuery {
        origin: origin.clone(),
        destination: destination.clone(),
        product: first.train_type.to_string(),
        class: "2".to_string(),
        profile: profile.to_string(),
    })
}

fn debug_view(state: &AppState, route_id: &RouteId, trip: &crate::domain::Trip) -> DebugTripView {
    DebugTripView {
        trip_id: trip.trip_id.to_string(),
        route_id: route_id.to_string(),
        service_id: trip.service_id.to_string(),
        operator: trip.operator.clone(),
        train_type: trip.train_type.to_string(),
        calls: trip
            .stop_times
            .iter()
            .map(|st| DebugCallView {
                stop_id: st.stop_id.to_string(),
                name: state
                    .snapshot
                    .stop_names
                    .get(&st.stop_id)
                    .cloned()
                    .unwrap_or_default(),
                arr_time: st.arrival_time.to_string(),
                dep_time: st.departure_time.to_string(),
            })
            .collect(),
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("invalid date: {s}"))),
        None => Ok(None),
    }
}

fn parse_train_types(raw: &str) -> HashSet<TrainType> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(TrainType::parse)
        .collect()
}

/// Application error type; always terminates in a JSON body.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        warn!(%status, %message, "request failed");
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrainType;

    #[test]
    fn train_type_parsing_from_query() {
        let parsed = parse_train_types("INOUI, TER,OUIGO");
        assert!(parsed.contains(&TrainType::Inoui));
        assert!(parsed.contains(&TrainType::Ter));
        assert!(parsed.contains(&TrainType::Ouigo));
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn date_parsing() {
        assert_eq!(
            parse_date(Some("2025-01-10")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(parse_date(Some("")).unwrap(), None);
        assert!(parse_date(Some("20250110")).is_err());
    }
}
