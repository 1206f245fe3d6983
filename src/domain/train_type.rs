//! Train product classification.
//!
//! Each trip is labeled at ingestion with a commercial product. Rules are
//! operator-specific, keyed with decreasing precedence on a platform token
//! embedded in the stop-point identifier, substrings of the trip
//! identifier, and the route short name. The label is stored on the trip
//! and never recomputed at query time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Commercial train product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrainType {
    #[serde(rename = "INOUI")]
    Inoui,
    #[serde(rename = "OUIGO")]
    Ouigo,
    #[serde(rename = "OUIGO_CLASSIQUE")]
    OuigoClassique,
    #[serde(rename = "IC")]
    Intercites,
    #[serde(rename = "IC_NUIT")]
    IntercitesDeNuit,
    #[serde(rename = "LYRIA")]
    Lyria,
    #[serde(rename = "TER")]
    Ter,
    #[serde(rename = "FRECCIAROSSA")]
    Frecciarossa,
    #[serde(rename = "EUROSTAR")]
    Eurostar,
    #[serde(rename = "NIGHTJET")]
    Nightjet,
    #[serde(rename = "EC")]
    Eurocity,
    #[serde(rename = "THALYS_CORRIDOR")]
    ThalysCorridor,
    #[serde(rename = "IC_SNCB")]
    IntercitySncb,
    #[serde(rename = "ICE")]
    Ice,
    #[serde(rename = "IC_DB")]
    IntercityDb,
    #[serde(rename = "AVE")]
    Ave,
    #[serde(rename = "ALVIA")]
    Alvia,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl TrainType {
    /// The wire/artifact name of the product.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inoui => "INOUI",
            Self::Ouigo => "OUIGO",
            Self::OuigoClassique => "OUIGO_CLASSIQUE",
            Self::Intercites => "IC",
            Self::IntercitesDeNuit => "IC_NUIT",
            Self::Lyria => "LYRIA",
            Self::Ter => "TER",
            Self::Frecciarossa => "FRECCIAROSSA",
            Self::Eurostar => "EUROSTAR",
            Self::Nightjet => "NIGHTJET",
            Self::Eurocity => "EC",
            Self::ThalysCorridor => "THALYS_CORRIDOR",
            Self::IntercitySncb => "IC_SNCB",
            Self::Ice => "ICE",
            Self::IntercityDb => "IC_DB",
            Self::Ave => "AVE",
            Self::Alvia => "ALVIA",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire name back into a product. Unrecognized names map to
    /// `Unknown` so a stale filter string cannot fail a request.
    pub fn parse(s: &str) -> Self {
        match s {
            "INOUI" => Self::Inoui,
            "OUIGO" => Self::Ouigo,
            "OUIGO_CLASSIQUE" => Self::OuigoClassique,
            "IC" => Self::Intercites,
            "IC_NUIT" => Self::IntercitesDeNuit,
            "LYRIA" => Self::Lyria,
            "TER" => Self::Ter,
            "FRECCIAROSSA" => Self::Frecciarossa,
            "EUROSTAR" => Self::Eurostar,
            "NIGHTJET" => Self::Nightjet,
            "EC" => Self::Eurocity,
            "THALYS_CORRIDOR" => Self::ThalysCorridor,
            "IC_SNCB" => Self::IntercitySncb,
            "ICE" => Self::Ice,
            "IC_DB" => Self::IntercityDb,
            "AVE" => Self::Ave,
            "ALVIA" => Self::Alvia,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a trip into a commercial product.
///
/// * `operator` — the feed's operator code (`SNCF`, `TI`, …).
/// * `platform_token` — the product token embedded in the first stop-point
///   identifier of the trip (SNCF encodes it between `OCE` and `-`), if any.
/// * `trip_id` — the raw trip identifier.
/// * `route_short_name` — the feed's route short name.
pub fn classify(
    operator: &str,
    platform_token: Option<&str>,
    trip_id: &str,
    route_short_name: &str,
) -> TrainType {
    match operator {
        "SNCF" => classify_sncf(platform_token, trip_id, route_short_name),
        "TI" => {
            if route_short_name.eq_ignore_ascii_case("EC") {
                TrainType::Eurocity
            } else {
                TrainType::Frecciarossa
            }
        }
        "ES" => TrainType::Eurostar,
        "SNCB" => match route_short_name {
            "IC" => TrainType::IntercitySncb,
            "EC" => TrainType::Eurocity,
            "NJ" => TrainType::Nightjet,
            "OTC" => TrainType::ThalysCorridor,
            _ => TrainType::Unknown,
        },
        "DB" => {
            if route_short_name.starts_with("ICE") {
                TrainType::Ice
            } else if route_short_name.starts_with("NJ") {
                TrainType::Nightjet
            } else if route_short_name.starts_with("EC") {
                TrainType::Eurocity
            } else if route_short_name.starts_with("IC") {
                TrainType::IntercityDb
            } else {
                TrainType::Unknown
            }
        }
        "RENFE" => {
            if route_short_name.starts_with("AVE") || trip_id.contains("AVE") {
                TrainType::Ave
            } else if route_short_name.starts_with("ALVIA") || trip_id.contains("ALVIA") {
                TrainType::Alvia
            } else {
                TrainType::Unknown
            }
        }
        "OUIGO_ES" => TrainType::Ouigo,
        _ => TrainType::Unknown,
    }
}

/// SNCF precedence: platform token, then trip-id substrings, then route
/// short name.
fn classify_sncf(platform_token: Option<&str>, trip_id: &str, route_short_name: &str) -> TrainType {
    if let Some(token) = platform_token {
        let token_upper = token.to_uppercase();
        if token_upper.contains("NUIT") {
            return TrainType::IntercitesDeNuit;
        }
        if token_upper.contains("INOUI") {
            return TrainType::Inoui;
        }
        if token_upper.contains("OUIGO") {
            return ouigo_by_number(trip_id);
        }
        if token_upper.contains("LYRIA") {
            return TrainType::Lyria;
        }
        if token_upper.contains("INTERCIT") {
            return TrainType::Intercites;
        }
        if token_upper.contains("TER") {
            return TrainType::Ter;
        }
        if token_upper.contains("ICE") {
            return TrainType::Ice;
        }
    }

    let id_upper = trip_id.to_uppercase();
    if id_upper.contains("OUIGO") {
        return ouigo_by_number(trip_id);
    }
    if id_upper.contains("LYRIA") {
        return TrainType::Lyria;
    }

    match route_short_name {
        "TER" => TrainType::Ter,
        "IC" => TrainType::Intercites,
        "ICN" => TrainType::IntercitesDeNuit,
        _ => TrainType::Unknown,
    }
}

/// OUIGO splits on the train-number range: 7xxx runs on high-speed lines,
/// 4xxx is the classic (conventional-line) product.
fn ouigo_by_number(trip_id: &str) -> TrainType {
    match train_number(trip_id) {
        Some(n) if (7000..8000).contains(&n) => TrainType::Ouigo,
        Some(n) if (4000..5000).contains(&n) => TrainType::OuigoClassique,
        _ => TrainType::Ouigo,
    }
}

/// First run of 4+ digits in a trip identifier, read as the train number.
fn train_number(trip_id: &str) -> Option<u32> {
    let bytes = trip_id.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start >= 4 {
                return trip_id[start..i].parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sncf_platform_token_wins() {
        assert_eq!(
            classify("SNCF", Some("TGV INOUI"), "88123", "X"),
            TrainType::Inoui
        );
        assert_eq!(
            classify("SNCF", Some("Train TER"), "88123", "X"),
            TrainType::Ter
        );
        assert_eq!(
            classify("SNCF", Some("INTERCITES de nuit"), "5771", "IC"),
            TrainType::IntercitesDeNuit
        );
    }

    #[test]
    fn sncf_trip_id_beats_route_name() {
        assert_eq!(
            classify("SNCF", None, "OUIGO7641", "TER"),
            TrainType::Ouigo
        );
        assert_eq!(classify("SNCF", None, "Lyria9261", "X"), TrainType::Lyria);
    }

    #[test]
    fn sncf_route_short_name_fallback() {
        assert_eq!(classify("SNCF", None, "x", "TER"), TrainType::Ter);
        assert_eq!(classify("SNCF", None, "x", "IC"), TrainType::Intercites);
    }

    #[test]
    fn ouigo_number_ranges() {
        assert_eq!(
            classify("SNCF", Some("OUIGO"), "OUIGO-7712", "X"),
            TrainType::Ouigo
        );
        assert_eq!(
            classify("SNCF", Some("OUIGO"), "OUIGO-4301", "X"),
            TrainType::OuigoClassique
        );
        // Unparseable number defaults to high-speed OUIGO
        assert_eq!(
            classify("SNCF", Some("OUIGO"), "OUIGO-x", "X"),
            TrainType::Ouigo
        );
    }

    #[test]
    fn other_operators() {
        assert_eq!(classify("TI", None, "x", "FR9580"), TrainType::Frecciarossa);
        assert_eq!(classify("TI", None, "x", "EC"), TrainType::Eurocity);
        assert_eq!(classify("ES", None, "x", ""), TrainType::Eurostar);
        assert_eq!(classify("SNCB", None, "x", "IC"), TrainType::IntercitySncb);
        assert_eq!(classify("SNCB", None, "x", "NJ"), TrainType::Nightjet);
        assert_eq!(classify("DB", None, "x", "ICE 78"), TrainType::Ice);
        assert_eq!(classify("DB", None, "x", "IC 2044"), TrainType::IntercityDb);
        assert_eq!(classify("RENFE", None, "x", "AVE"), TrainType::Ave);
        assert_eq!(classify("OUIGO_ES", None, "x", ""), TrainType::Ouigo);
    }

    #[test]
    fn wire_roundtrip() {
        for t in [
            TrainType::Inoui,
            TrainType::OuigoClassique,
            TrainType::IntercitesDeNuit,
            TrainType::ThalysCorridor,
            TrainType::Ave,
        ] {
            assert_eq!(TrainType::parse(t.as_str()), t);
        }
        assert_eq!(TrainType::parse("FOO"), TrainType::Unknown);
    }
}
