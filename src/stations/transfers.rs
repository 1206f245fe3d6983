//! Transfer index construction.
//!
//! Four layers, later ones refining earlier ones: geographic pairing of
//! stops within walking range, curated manifest pairs (authoritative),
//! TI↔SNCF normalized-name links, and inter-city links between stations of
//! the same metropolitan city. The resulting category on each link decides
//! the minimum dwell the search applies when crossing it.

use std::collections::HashMap;

use tracing::info;

use crate::domain::{haversine_m, Station, Stop, StopId, TransferEdge, TransferIndex, TransferKind};

use super::manifest::StationManifest;
use super::names::normalize_name;
use super::reconcile::city_groups;

/// Stops closer than this are assumed walkable siblings. Experimental
/// constant; quadratic pairing is acceptable at tens of thousands of stops.
const PAIRING_RADIUS_M: f64 = 300.0;

/// Build the transfer index.
pub fn build_transfer_index(
    stops: &HashMap<StopId, Stop>,
    manifest: &StationManifest,
    stations: &[Station],
) -> TransferIndex {
    let mut index = TransferIndex::new();

    // 1. Geographic pairing, symmetric.
    let mut sorted: Vec<(&StopId, &Stop)> = stops.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for (i, (id_a, stop_a)) in sorted.iter().enumerate() {
        for (id_b, stop_b) in &sorted[i + 1..] {
            if haversine_m(stop_a.lat, stop_a.lon, stop_b.lat, stop_b.lon) <= PAIRING_RADIUS_M {
                let kind = same_station_kind(id_a, id_b);
                upsert(&mut index, id_a, id_b, kind, false);
                upsert(&mut index, id_b, id_a, kind, false);
            }
        }
    }

    // 2. Manifest enrichment: every unordered pair within a curated
    // station is a same-station link, overriding whatever geography said.
    for entry in &manifest.stations {
        let members: Vec<&StopId> = entry
            .members
            .iter()
            .filter(|m| stops.contains_key(*m))
            .collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                let kind = same_station_kind(a, b);
                upsert(&mut index, a, b, kind, true);
                upsert(&mut index, b, a, kind, true);
            }
        }
    }

    // 3. Cross-operator name linking: TI stops to SNCF stops sharing a
    // normalized name.
    let mut sncf_by_name: HashMap<String, Vec<&StopId>> = HashMap::new();
    for (id, stop) in &sorted {
        if id.operator() == "SNCF" {
            sncf_by_name
                .entry(normalize_name(&stop.name))
                .or_default()
                .push(id);
        }
    }
    for (id, stop) in &sorted {
        if id.operator() != "TI" {
            continue;
        }
        if let Some(siblings) = sncf_by_name.get(&normalize_name(&stop.name)) {
            for sibling in siblings {
                upsert(
                    &mut index,
                    id,
                    sibling,
                    TransferKind::SameStationCrossOperator,
                    false,
                );
                upsert(
                    &mut index,
                    sibling,
                    id,
                    TransferKind::SameStationCrossOperator,
                    false,
                );
            }
        }
    }

    // 4. Inter-city links: stops of different stations within one
    // metropolitan city. Never downgrades an existing same-station link.
    for (_, station_indices) in city_groups(stations) {
        for (i, &sa) in station_indices.iter().enumerate() {
            for &sb in &station_indices[i + 1..] {
                for a in &stations[sa].member_stop_ids {
                    for b in &stations[sb].member_stop_ids {
                        if !stops.contains_key(a) || !stops.contains_key(b) {
                            continue;
                        }
                        upsert(&mut index, a, b, TransferKind::InterCitySameMetro, false);
                        upsert(&mut index, b, a, TransferKind::InterCitySameMetro, false);
                    }
                }
            }
        }
    }

    info!(
        stops_with_transfers = index.len(),
        edges = index.values().map(Vec::len).sum::<usize>(),
        "transfer index built"
    );
    index
}

/// Same-station category of a pair, from operator-prefix equality.
fn same_station_kind(a: &StopId, b: &StopId) -> TransferKind {
    if a.operator() == b.operator() {
        TransferKind::SameStationSameOperator
    } else {
        TransferKind::SameStationCrossOperator
    }
}

/// Insert or update one directed edge. With `override_existing`, an
/// existing edge's category is replaced; otherwise the existing edge wins.
fn upsert(
    index: &mut TransferIndex,
    from: &StopId,
    to: &StopId,
    kind: TransferKind,
    override_existing: bool,
) {
    let edges = index.entry(from.clone()).or_default();
    match edges.iter_mut().find(|e| &e.to == to) {
        Some(edge) if override_existing => edge.kind = kind,
        Some(_) => {}
        None => edges.push(TransferEdge {
            to: to.clone(),
            kind,
        }),
    }
}
