//! Timetable assembly and persistence.
//!
//! The builder turns heterogeneous raw feeds into the unified, route-shaped
//! tables round-based search needs; the artifact layer persists them as one
//! JSON document per table.

mod artifacts;
mod builder;
mod calendar;
mod repair;

pub use artifacts::{
    load, save_meta, save_stations, save_timetable, save_transfers, ArtifactError, Artifacts, Meta,
};
pub use builder::{build, Timetable};
pub use calendar::{expand, CalendarIndex};
pub use repair::repair_stop_times;
