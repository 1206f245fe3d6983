//! Multi-operator rail itinerary planner.
//!
//! Answers "from A to B, departing after T on date D" over a merged
//! timetable drawn from several independent operator feeds (SNCF,
//! Trenitalia, Eurostar, SNCB, DB, RENFE, …). Static schedules are
//! ingested offline into persisted artifacts; the query engine loads them
//! at startup and serves round-based journey search over HTTP.

pub mod config;
pub mod domain;
pub mod feed;
pub mod planner;
pub mod stations;
pub mod tarifs;
pub mod timetable;
pub mod web;
