//! The round-based search core.
//!
//! Classical round-based public transit search over the merged timetable:
//! each round allows one additional boarded trip, relaxing arrival times
//! through trips first and walking transfers second. The scan is per-stop
//! rather than the canonical per-route sweep; the duplicate work is paid
//! for clarity and does not change results, since only the min-reduction
//! into the best-arrival map matters.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::domain::{
    DayTime, RouteId, StopId, TrainType, TransferKind, TripId,
};

use super::config::SearchConfig;
use super::snapshot::{StopToTrips, TimetableSnapshot};

/// How a stop's best arrival was reached: by riding a trip or by walking a
/// transfer edge.
#[derive(Debug, Clone)]
pub enum Parent {
    Ride {
        board_stop: StopId,
        board_dep: DayTime,
        arr: DayTime,
        trip_id: TripId,
        route_id: RouteId,
        train_type: TrainType,
        operator: String,
    },
    Transfer {
        from: StopId,
        kind: TransferKind,
    },
}

/// The outcome of running the rounds from one start time.
pub struct SearchState {
    /// Earliest arrival found per stop, across all rounds.
    pub tau_best: HashMap<StopId, DayTime>,
    /// Predecessor of each reached stop.
    pub parent: HashMap<StopId, Parent>,
    /// The effective origin set: the requested origins plus their
    /// same-station transfer neighbours. Reconstruction stops here.
    pub origins: HashSet<StopId>,
}

/// Inputs shared by every round of one search invocation.
pub struct SearchContext<'a> {
    pub snapshot: &'a TimetableSnapshot,
    pub stop_to_trips: &'a StopToTrips,
    /// Month of the query date (1–12), for the per-operator timezone
    /// adjustment. `None` for dateless queries.
    pub month: Option<u32>,
    /// When present, only trips of these products may be boarded.
    pub allowed_types: Option<&'a HashSet<TrainType>>,
}

impl SearchContext<'_> {
    /// Seconds to add when reading a schedule time of `operator`'s trips.
    ///
    /// Trenitalia times are Italian local but the merged timeline is
    /// France-local: +2h during the summer months (April–September), +1h
    /// otherwise; dateless queries assume winter. Applied at read time,
    /// never stored.
    fn tz_offset_secs(&self, operator: &str) -> i32 {
        if operator != "TI" {
            return 0;
        }
        match self.month {
            Some(4..=9) => 7200,
            _ => 3600,
        }
    }
}

/// Run up to `config.max_rounds` rounds from `start`, seeding `origins`
/// and their transfer neighbours.
pub fn run_rounds(
    ctx: &SearchContext<'_>,
    origins: &[StopId],
    start: DayTime,
    config: &SearchConfig,
) -> SearchState {
    let mut tau_best: HashMap<StopId, DayTime> = HashMap::new();
    let mut parent: HashMap<StopId, Parent> = HashMap::new();
    let mut origin_set: HashSet<StopId> = HashSet::new();
    let mut marked: HashSet<StopId> = HashSet::new();

    // Seed the origins, then their transfer neighbours at start + dwell.
    // Inter-city neighbours are reachable but stay outside the origin set,
    // so a journey departing from one carries its walk as a transfer.
    for origin in origins {
        tau_best.insert(origin.clone(), start);
        origin_set.insert(origin.clone());
        marked.insert(origin.clone());
    }
    for origin in origins {
        let Some(edges) = ctx.snapshot.transfers.get(origin) else {
            continue;
        };
        for edge in edges {
            let seeded = start + edge.kind.min_dwell_secs();
            if tau_best.get(&edge.to).is_none_or(|&t| seeded < t) {
                tau_best.insert(edge.to.clone(), seeded);
                parent.insert(
                    edge.to.clone(),
                    Parent::Transfer {
                        from: origin.clone(),
                        kind: edge.kind,
                    },
                );
                marked.insert(edge.to.clone());
                if edge.kind != TransferKind::InterCitySameMetro {
                    origin_set.insert(edge.to.clone());
                }
            }
        }
    }

    for round in 0..config.max_rounds {
        if marked.is_empty() {
            break;
        }
        let mut scan: Vec<StopId> = marked.drain().collect();
        scan.sort();
        trace!(round, scanned = scan.len(), "scanning round");

        let mut tau_cur: HashMap<StopId, DayTime> = HashMap::new();

        // Trip scans from every stop improved in the previous round.
        for stop in &scan {
            let Some(entries) = ctx.stop_to_trips.get(stop) else {
                continue;
            };
            for entry in entries {
                if let Some(allowed) = ctx.allowed_types {
                    if !allowed.contains(&entry.trip.train_type) {
                        continue;
                    }
                }
                let offset = ctx.tz_offset_secs(&entry.trip.operator);
                let stop_times = &entry.trip.stop_times;

                // Board at the first position from this stop onward whose
                // best-known arrival makes the departure.
                let mut board: Option<usize> = None;
                for (j, st) in stop_times.iter().enumerate().skip(entry.idx) {
                    if j + 1 == stop_times.len() {
                        break; // boarding at the terminus goes nowhere
                    }
                    if let Some(&tau) = tau_best.get(&st.stop_id) {
                        if tau <= st.departure_time + offset {
                            board = Some(j);
                            break;
                        }
                    }
                }
                let Some(j) = board else {
                    continue;
                };
                let board_stop = &stop_times[j];
                let board_dep = board_stop.departure_time + offset;

                // Relax arrivals at every subsequent stop.
                for st in &stop_times[j + 1..] {
                    let arr = st.arrival_time + offset;
                    if tau_best.get(&st.stop_id).is_none_or(|&t| arr < t) {
                        tau_best.insert(st.stop_id.clone(), arr);
                        tau_cur.insert(st.stop_id.clone(), arr);
                        parent.insert(
                            st.stop_id.clone(),
                            Parent::Ride {
                                board_stop: board_stop.stop_id.clone(),
                                board_dep,
                                arr,
                                trip_id: entry.trip.trip_id.clone(),
                                route_id: entry.route_id.clone(),
                                train_type: entry.trip.train_type,
                                operator: entry.trip.operator.clone(),
                            },
                        );
                        marked.insert(st.stop_id.clone());
                    }
                }
            }
        }

        // Transfer relaxation from every stop improved this round. One
        // pass over a fixed snapshot of the improvements: transfers do not
        // chain within a round.
        let mut improved: Vec<(StopId, DayTime)> = tau_cur.into_iter().collect();
        improved.sort();
        for (stop, tau) in improved {
            let Some(edges) = ctx.snapshot.transfers.get(&stop) else {
                continue;
            };
            for edge in edges {
                let candidate = tau + edge.kind.min_dwell_secs();
                if tau_best.get(&edge.to).is_none_or(|&t| candidate < t) {
                    tau_best.insert(edge.to.clone(), candidate);
                    parent.insert(
                        edge.to.clone(),
                        Parent::Transfer {
                            from: stop.clone(),
                            kind: edge.kind,
                        },
                    );
                    marked.insert(edge.to.clone());
                }
            }
        }
    }

    SearchState {
        tau_best,
        parent,
        origins: origin_set,
    }
}
