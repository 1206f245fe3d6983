//! Flat tariff product index.
//!
//! A peripheral lookup table keyed by origin, destination, product, class
//! and traveller profile. Loaded once at startup from `tarifs.json`; a
//! missing file leaves the index empty and every lookup unpriced.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One priced product row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TarifEntry {
    pub origin: String,
    pub destination: String,
    pub product: String,
    pub class: String,
    pub profile: String,
    pub price: f64,
}

/// Lookup key for a priced product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TarifQuery {
    pub origin: String,
    pub destination: String,
    pub product: String,
    pub class: String,
    pub profile: String,
}

/// The flat index.
#[derive(Debug, Default)]
pub struct TarifIndex {
    prices: HashMap<TarifQuery, f64>,
}

impl TarifIndex {
    /// Load `tarifs.json` from the data directory. Missing file → empty
    /// index with a warning.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                warn!(path = %path.display(), "tariff index missing, prices disabled");
                return Self::default();
            }
        };
        let entries: Vec<TarifEntry> = match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "tariff index unreadable, prices disabled");
                return Self::default();
            }
        };
        let index = Self::from_entries(entries);
        info!(prices = index.prices.len(), "tariff index loaded");
        index
    }

    pub fn from_entries(entries: Vec<TarifEntry>) -> Self {
        let prices = entries
            .into_iter()
            .map(|e| {
                (
                    TarifQuery {
                        origin: e.origin,
                        destination: e.destination,
                        product: e.product,
                        class: e.class,
                        profile: e.profile,
                    },
                    e.price,
                )
            })
            .collect();
        Self { prices }
    }

    /// Price for an exact key, if listed.
    pub fn lookup(&self, query: &TarifQuery) -> Option<f64> {
        self.prices.get(query).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
