//! Domain types for the merged multi-operator timetable.
//!
//! Everything here is built once by the offline pipeline and read-only at
//! query time. Identifiers always carry their operator prefix; schedule
//! times are seconds from local midnight and may exceed 86 400.

mod id;
mod journey;
mod station;
mod stop;
mod time;
mod train_type;
mod trip;

pub use id::{RouteId, ServiceId, StopId, TripId};
pub use journey::{Journey, Leg};
pub use station::{CityKey, Station, TransferEdge, TransferIndex, TransferKind};
pub use stop::{haversine_m, Stop};
pub use time::{DayTime, TimeError};
pub use train_type::{classify, TrainType};
pub use trip::{RouteInfo, StopTime, Trip};
