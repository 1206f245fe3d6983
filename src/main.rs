use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rail_planner::config::ServerConfig;
use rail_planner::planner::{SearchConfig, TimetableSnapshot};
use rail_planner::tarifs::TarifIndex;
use rail_planner::timetable;
use rail_planner::web::{create_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();

    let artifacts = match timetable::load(&config.data_dir) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            // The engine cannot serve without its tables.
            error!(error = %e, "failed to load artifacts");
            std::process::exit(1);
        }
    };

    let snapshot = TimetableSnapshot::new(artifacts);
    let tarifs = TarifIndex::load(&config.data_dir.join("tarifs.json"));
    let state = AppState::new(snapshot, SearchConfig::default(), tarifs);
    let app = create_router(state, config.static_dir.as_deref());

    info!(addr = %config.addr, "listening");
    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %config.addr, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}
