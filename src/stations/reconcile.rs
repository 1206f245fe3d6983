//! Station index construction.
//!
//! An idempotent reconciliation that groups the merged stop universe into
//! logical stations: the curated UIC-keyed manifest first, then
//! Eurostar-slug matching, then the feeds' own transfer tables (minus a
//! blacklist of known bad links), then administrative parent areas, and
//! finally normalized-name grouping for whatever is left. Every stop ends
//! up in exactly one station; leftovers become singleton stations.

use std::collections::HashMap;

use tracing::info;

use crate::domain::{CityKey, Station, Stop, StopId};

use super::manifest::StationManifest;
use super::names::{country_from_uic, eurostar_slug, normalize_name, uic_code};

/// Known bad geographic/transfer links, as normalized name pairs. The
/// Paris-Est / paris_nord pair is a recurring false positive: the stations
/// are 400 m apart but distinct.
const LINK_BLACKLIST: &[(&str, &str)] = &[("paris est", "paris nord")];

#[derive(Debug, Default)]
struct StationBuild {
    name: String,
    city: String,
    country: String,
    members: Vec<StopId>,
}

/// Build the station index.
pub fn build_station_index(
    stops: &HashMap<StopId, Stop>,
    parents: &HashMap<StopId, StopId>,
    manifest: &StationManifest,
    feed_transfer_pairs: &[(StopId, StopId)],
) -> Vec<Station> {
    let mut builds: Vec<Option<StationBuild>> = Vec::new();
    let mut assigned: HashMap<StopId, usize> = HashMap::new();

    // Primary pass: the curated manifest.
    for entry in &manifest.stations {
        let members: Vec<StopId> = entry
            .members
            .iter()
            .filter(|m| stops.contains_key(*m) && !assigned.contains_key(*m))
            .cloned()
            .collect();
        let idx = builds.len();
        builds.push(Some(StationBuild {
            name: entry.name.clone(),
            city: entry.city.clone(),
            country: entry.country.clone(),
            members: members.clone(),
        }));
        for m in members {
            assigned.insert(m, idx);
        }
    }

    // Keep manifest stations addressable by slug and by normalized name
    // for the Eurostar pass.
    let mut by_slug: HashMap<String, usize> = HashMap::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (idx, (build, entry)) in builds
        .iter()
        .flatten()
        .zip(&manifest.stations)
        .enumerate()
    {
        if let Some(slug) = &entry.eurostar_slug {
            by_slug.insert(eurostar_slug(slug).to_string(), idx);
        }
        by_name.entry(normalize_name(&build.name)).or_insert(idx);
    }

    // Eurostar slugs: `paris_nord_3` belongs to the station whose manifest
    // slug (or normalized name) matches `paris nord`.
    for (stop_id, stop) in stops {
        if stop_id.operator() != "ES" || assigned.contains_key(stop_id) {
            continue;
        }
        let slug = eurostar_slug(stop_id.local());
        let target = by_slug
            .get(slug)
            .or_else(|| by_name.get(&normalize_name(&slug.replace('_', " "))))
            .or_else(|| by_name.get(&normalize_name(&stop.name)))
            .copied();
        if let Some(idx) = target {
            if let Some(build) = builds[idx].as_mut() {
                build.members.push(stop_id.clone());
                assigned.insert(stop_id.clone(), idx);
            }
        }
    }

    // Whitelist pass: the feeds' own transfer tables link stop points that
    // belong together, except for blacklisted pairs. Two sweeps are enough
    // to chain simple A-B-C cases.
    let whitelist: Vec<&(StopId, StopId)> = feed_transfer_pairs
        .iter()
        .filter(|(a, b)| !is_blacklisted(stops, a, b))
        .collect();
    for _ in 0..2 {
        for (a, b) in &whitelist {
            match (assigned.get(a).copied(), assigned.get(b).copied()) {
                (Some(idx), None) => {
                    if stops.contains_key(b) {
                        if let Some(build) = builds[idx].as_mut() {
                            build.members.push(b.clone());
                            assigned.insert(b.clone(), idx);
                        }
                    }
                }
                (None, Some(idx)) => {
                    if stops.contains_key(a) {
                        if let Some(build) = builds[idx].as_mut() {
                            build.members.push(a.clone());
                            assigned.insert(a.clone(), idx);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // Administrative parent areas: stops sharing a feed-provided parent
    // form one station (joining an existing one if any sibling is already
    // placed).
    let mut by_parent: HashMap<&StopId, Vec<&StopId>> = HashMap::new();
    for (stop_id, parent) in parents {
        if stops.contains_key(stop_id) {
            by_parent.entry(parent).or_default().push(stop_id);
        }
    }
    for (parent, children) in by_parent {
        let existing = children.iter().find_map(|c| assigned.get(*c)).copied();
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let name = stops
                    .get(parent)
                    .map(|s| s.name.clone())
                    .or_else(|| children.first().and_then(|c| stops.get(*c)).map(|s| s.name.clone()))
                    .unwrap_or_default();
                let idx = builds.len();
                builds.push(Some(StationBuild {
                    name,
                    ..StationBuild::default()
                }));
                idx
            }
        };
        for child in children {
            if !assigned.contains_key(child) {
                if let Some(build) = builds[idx].as_mut() {
                    build.members.push(child.clone());
                    assigned.insert(child.clone(), idx);
                }
            }
        }
    }

    // Orphans: group the remainder by normalized name.
    let mut orphan_groups: HashMap<String, usize> = HashMap::new();
    let mut leftover: Vec<(&StopId, &Stop)> = stops
        .iter()
        .filter(|(id, _)| !assigned.contains_key(*id))
        .collect();
    leftover.sort_by(|a, b| a.0.cmp(b.0));
    for (stop_id, stop) in leftover {
        let key = normalize_name(&stop.name);
        let idx = *orphan_groups.entry(key).or_insert_with(|| {
            let idx = builds.len();
            builds.push(Some(StationBuild {
                name: stop.name.clone(),
                ..StationBuild::default()
            }));
            idx
        });
        if let Some(build) = builds[idx].as_mut() {
            build.members.push(stop_id.clone());
            assigned.insert(stop_id.clone(), idx);
        }
    }

    // Post-pass: a station known by SNCF identifiers and a station known
    // only by ES identifiers joined by a whitelisted link share one
    // physical place; fuse them and drop the ES-only duplicate.
    for (a, b) in &whitelist {
        let (Some(&ia), Some(&ib)) = (assigned.get(a), assigned.get(b)) else {
            continue;
        };
        if ia == ib {
            continue;
        }
        let (es_only, target) = if is_es_only(&builds, ia) && has_operator(&builds, ib, "SNCF") {
            (ia, ib)
        } else if is_es_only(&builds, ib) && has_operator(&builds, ia, "SNCF") {
            (ib, ia)
        } else {
            continue;
        };
        let Some(dropped) = builds[es_only].take() else {
            continue;
        };
        for member in &dropped.members {
            assigned.insert(member.clone(), target);
        }
        if let Some(build) = builds[target].as_mut() {
            build.members.extend(dropped.members);
        }
    }

    // Finalize: coordinates, operator sets, country inference, ordering.
    let mut stations: Vec<Station> = builds
        .into_iter()
        .flatten()
        .filter(|b| !b.members.is_empty())
        .map(|b| finalize(b, stops))
        .collect();
    stations.sort_by(|a, b| {
        presence_score(&a.operators)
            .cmp(&presence_score(&b.operators))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    info!(stations = stations.len(), stops = stops.len(), "station index built");
    stations
}

/// City groups: `(city, country)` keys shared by at least two stations,
/// exposed for "search from city" queries.
pub fn city_groups(stations: &[Station]) -> HashMap<CityKey, Vec<usize>> {
    let mut groups: HashMap<CityKey, Vec<usize>> = HashMap::new();
    for (idx, station) in stations.iter().enumerate() {
        if station.city.is_empty() {
            continue;
        }
        groups.entry(station.city_key()).or_default().push(idx);
    }
    groups.retain(|_, members| members.len() >= 2);
    groups
}

fn is_blacklisted(stops: &HashMap<StopId, Stop>, a: &StopId, b: &StopId) -> bool {
    let (Some(sa), Some(sb)) = (stops.get(a), stops.get(b)) else {
        return false;
    };
    let na = normalize_name(&sa.name);
    let nb = normalize_name(&sb.name);
    LINK_BLACKLIST
        .iter()
        .any(|(x, y)| (na == *x && nb == *y) || (na == *y && nb == *x))
}

fn is_es_only(builds: &[Option<StationBuild>], idx: usize) -> bool {
    builds[idx]
        .as_ref()
        .is_some_and(|b| !b.members.is_empty() && b.members.iter().all(|m| m.operator() == "ES"))
}

fn has_operator(builds: &[Option<StationBuild>], idx: usize, operator: &str) -> bool {
    builds[idx]
        .as_ref()
        .is_some_and(|b| b.members.iter().any(|m| m.operator() == operator))
}

fn finalize(build: StationBuild, stops: &HashMap<StopId, Stop>) -> Station {
    let mut operators: Vec<String> = build
        .members
        .iter()
        .map(|m| m.operator().to_string())
        .collect();
    operators.sort();
    operators.dedup();

    let coords: Vec<(f64, f64)> = build
        .members
        .iter()
        .filter_map(|m| stops.get(m))
        .map(|s| (s.lat, s.lon))
        .collect();
    let n = coords.len().max(1) as f64;
    let lat = coords.iter().map(|(lat, _)| lat).sum::<f64>() / n;
    let lon = coords.iter().map(|(_, lon)| lon).sum::<f64>() / n;

    let country = if !build.country.is_empty() {
        build.country
    } else {
        infer_country(&build.members)
    };
    let city = if !build.city.is_empty() {
        build.city
    } else {
        // No curated city; the station stands for itself.
        build.name.clone()
    };

    Station {
        display_name: build.name,
        city,
        country,
        member_stop_ids: build.members,
        operators,
        lat,
        lon,
    }
}

/// Country of an uncurated station: Spanish operators force ES, then the
/// UIC prefix of any member decides, then the operator's home country.
fn infer_country(members: &[StopId]) -> String {
    if members
        .iter()
        .any(|m| matches!(m.operator(), "RENFE" | "OUIGO_ES"))
    {
        return "ES".to_string();
    }
    for member in members {
        if let Some(country) = uic_code(member).and_then(country_from_uic) {
            return country.to_string();
        }
    }
    match members.first().map(|m| m.operator()) {
        Some("SNCF") => "FR",
        Some("TI") => "IT",
        Some("SNCB") => "BE",
        Some("DB") => "DE",
        _ => "",
    }
    .to_string()
}

/// Ordering score by operator presence: SNCF > RENFE > OUIGO_ES > ES > TI.
fn presence_score(operators: &[String]) -> u8 {
    for (score, op) in ["SNCF", "RENFE", "OUIGO_ES", "ES", "TI"].iter().enumerate() {
        if operators.iter().any(|o| o == op) {
            return score as u8;
        }
    }
    5
}
