//! Calendar expansion.
//!
//! Walks each operator's weekly service table over its validity interval,
//! enumerates concrete dates, then applies date-level add/remove
//! exceptions to yield the per-date active-service index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::domain::ServiceId;
use crate::feed::ServicePattern;

/// ISO date → set of service identifiers active on that date.
pub type CalendarIndex = BTreeMap<NaiveDate, BTreeSet<ServiceId>>;

/// Expand weekly patterns and exceptions into the per-date index.
pub fn expand(services: &HashMap<ServiceId, ServicePattern>) -> CalendarIndex {
    let mut index = CalendarIndex::new();

    for (service_id, pattern) in services {
        if let (Some(start), Some(end)) = (pattern.start, pattern.end) {
            let mut date = start;
            while date <= end {
                let weekday = date.weekday().num_days_from_monday() as usize;
                if pattern.weekdays[weekday] {
                    index.entry(date).or_default().insert(service_id.clone());
                }
                match date.succ_opt() {
                    Some(next) => date = next,
                    None => break,
                }
            }
        }

        for &date in &pattern.added {
            index.entry(date).or_default().insert(service_id.clone());
        }
        for &date in &pattern.removed {
            if let Some(set) = index.get_mut(&date) {
                set.remove(service_id);
            }
        }
    }

    index.retain(|_, set| !set.is_empty());
    index
}
