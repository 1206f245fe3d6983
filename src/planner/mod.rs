//! The query engine.
//!
//! Round-based search over the timetable snapshot: given origin stops,
//! destination stops (or none, for the reachable set), a departure time,
//! a date, and filters, it returns Pareto-optimal journeys — fewer
//! transfers, shorter duration, later but valid departure.

mod config;
mod enumerate;
mod reconstruct;
mod search;
mod snapshot;


pub use config::SearchConfig;
pub use enumerate::{explore, plan, PlanRequest, Reachable};
pub use reconstruct::reconstruct;
pub use search::{run_rounds, Parent, SearchContext, SearchState};
pub use snapshot::{StopToTrips, TimetableSnapshot, TripAtStop};
