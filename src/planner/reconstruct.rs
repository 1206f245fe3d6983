//! Journey reconstruction from the predecessor map.
//!
//! Walks parents from a destination back to any origin, collapsing
//! transfer-only edges and emitting one leg per boarded trip. The parent
//! graph can in principle contain cycles through transfer edges; a revisit
//! along the back-walk abandons the candidate.

use std::collections::HashSet;

use crate::domain::{Journey, Leg, StopId, TransferKind};

use super::search::{Parent, SearchState};
use super::snapshot::TimetableSnapshot;

/// Reconstruct the journey to `destination`, if one was found.
///
/// Returns `None` when the destination was never reached, when it is an
/// origin itself, when only transfer edges lead to it, or when the
/// back-walk revisits a stop (cyclic parent chain).
pub fn reconstruct(
    state: &SearchState,
    snapshot: &TimetableSnapshot,
    destination: &StopId,
) -> Option<Journey> {
    if state.origins.contains(destination) {
        return None;
    }

    let mut walk = destination.clone();
    let mut visited: HashSet<StopId> = HashSet::from([walk.clone()]);
    let mut legs_rev: Vec<Leg> = Vec::new();
    let mut leading_inter_city = false;

    loop {
        if state.origins.contains(&walk) {
            break;
        }
        match state.parent.get(&walk)? {
            Parent::Ride {
                board_stop,
                board_dep,
                arr,
                trip_id,
                route_id,
                train_type,
                operator,
            } => {
                let route_name = snapshot
                    .routes_info
                    .get(route_id)
                    .map(|info| {
                        if info.short.is_empty() {
                            info.long.clone()
                        } else {
                            info.short.clone()
                        }
                    })
                    .unwrap_or_default();
                legs_rev.push(Leg {
                    from_id: board_stop.clone(),
                    to_id: walk.clone(),
                    dep_time: *board_dep,
                    arr_time: *arr,
                    trip_id: trip_id.clone(),
                    route_id: route_id.clone(),
                    operator: operator.clone(),
                    train_type: *train_type,
                    route_name,
                    duration: *arr - *board_dep,
                });
                leading_inter_city = false;
                walk = board_stop.clone();
            }
            Parent::Transfer { from, kind } => {
                // A transfer between rides collapses into the leg
                // boundary; one left standing before the first ride marks
                // a journey that departs from an inter-city neighbour.
                if !legs_rev.is_empty() && *kind == TransferKind::InterCitySameMetro {
                    leading_inter_city = true;
                }
                walk = from.clone();
            }
        }
        if !visited.insert(walk.clone()) {
            return None;
        }
    }

    legs_rev.reverse();
    Journey::new(legs_rev, leading_inter_city)
}
