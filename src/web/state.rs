//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::{SearchConfig, TimetableSnapshot};
use crate::tarifs::TarifIndex;

/// Shared application state.
///
/// Everything here is read-only after startup; requests clone the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// The loaded timetable and its derived indexes.
    pub snapshot: Arc<TimetableSnapshot>,

    /// Search tuning parameters.
    pub config: Arc<SearchConfig>,

    /// Flat tariff lookup.
    pub tarifs: Arc<TarifIndex>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(snapshot: TimetableSnapshot, config: SearchConfig, tarifs: TarifIndex) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            config: Arc::new(config),
            tarifs: Arc::new(tarifs),
        }
    }
}
