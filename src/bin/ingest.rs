//! Offline ingestion pipeline: feeds → persisted artifacts.
//!
//! Reads one schedule directory per operator, assembles the merged
//! timetable, reconciles stations, and writes the artifact directory the
//! server loads at startup.

use std::fs;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rail_planner::config::IngestConfig;
use rail_planner::feed;
use rail_planner::stations::{build_station_index, build_transfer_index, StationManifest};
use rail_planner::timetable::{self, Meta};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = IngestConfig::from_env();
    info!(
        feeds = %config.feeds_dir.display(),
        out = %config.out_dir.display(),
        "ingesting feeds"
    );

    if let Err(e) = run(&config) {
        error!(error = %e, "ingestion failed");
        std::process::exit(1);
    }
}

fn run(config: &IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    let feeds = feed::read_feeds(&config.feeds_dir)?;
    let manifest = StationManifest::load(&config.manifest_path)?;

    let timetable = timetable::build(&feeds);
    let stations = build_station_index(&feeds.stops, &feeds.parents, &manifest, &feeds.transfer_pairs);
    let transfers = build_transfer_index(&feeds.stops, &manifest, &stations);

    fs::create_dir_all(&config.out_dir)?;
    timetable::save_timetable(&config.out_dir, &timetable)?;
    timetable::save_stations(&config.out_dir, &stations)?;
    timetable::save_transfers(&config.out_dir, &transfers)?;

    let meta = Meta {
        built_at: chrono::Utc::now().to_rfc3339(),
        operators: feeds.operators.clone(),
        stops: timetable.stops.len(),
        routes: timetable.routes_info.len(),
        trips: timetable.route_trips.values().map(Vec::len).sum(),
        dates: timetable.calendar.len(),
    };
    timetable::save_meta(&config.out_dir, &meta)?;

    info!(
        stations = stations.len(),
        trips = meta.trips,
        dates = meta.dates,
        "artifacts written"
    );
    Ok(())
}
