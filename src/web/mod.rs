//! HTTP surface.
//!
//! A thin JSON layer over the query engine: journey search, explore,
//! autocomplete, metadata, trip inspection and tariff lookup. Every
//! request terminates with a JSON response; missing required parameters
//! are a 400 with a one-line message.

mod dto;
mod routes;
mod state;

pub use routes::{create_router, AppError};
pub use state::AppState;
