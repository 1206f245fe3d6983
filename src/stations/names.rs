//! Name normalization and UIC helpers.
//!
//! Operators spell the same station differently ("Gare de Lyon-Part-Dieu",
//! "LYON PART DIEU", "lyon_part_dieu_1"). Matching happens on a normalized
//! form: lowercased, accents stripped, runs of non-alphanumerics collapsed
//! to a single space.

use crate::domain::StopId;

/// Normalize a station or stop name for cross-operator comparison.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    let mut push = |c: char, out: &mut String, pending_space: &mut bool| {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            if *pending_space && !out.is_empty() {
                out.push(' ');
            }
            *pending_space = false;
            out.push(lower);
        } else {
            *pending_space = true;
        }
    };
    for c in name.chars() {
        match fold_accent(c) {
            Some(folded) => {
                for f in folded.chars() {
                    push(f, &mut out, &mut pending_space);
                }
            }
            None => push(c, &mut out, &mut pending_space),
        }
    }
    out
}

/// Fold the accented characters seen in French, Italian, Spanish, German
/// and Dutch station names to their ASCII base. Characters outside the
/// table pass through (and non-alphanumerics are then dropped).
fn fold_accent(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ä' | 'À' | 'Á' | 'Â' | 'Ä' => "a",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ß' => "ss",
        'œ' | 'Œ' => "oe",
        'æ' | 'Æ' => "ae",
        _ => return None,
    })
}

/// The Eurostar feed keys stop points as `<slug>_<n>` (`paris_nord_3`);
/// the slug identifies the station.
pub fn eurostar_slug(local_id: &str) -> &str {
    match local_id.rfind('_') {
        Some(pos) if local_id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) => &local_id[..pos],
        _ => local_id,
    }
}

/// The trailing 8-digit UIC code embedded in an identifier, if present
/// (`StopPoint:OCETrain TER-87391003` → `87391003`).
pub fn uic_code(stop_id: &StopId) -> Option<&str> {
    let s = stop_id.as_str();
    let bytes = s.as_bytes();
    let mut end = bytes.len();
    while end > 0 && !bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if end > start && end - start == 8 {
        Some(&s[start..end])
    } else {
        None
    }
}

/// Country of a UIC code, by its two-digit prefix.
pub fn country_from_uic(uic: &str) -> Option<&'static str> {
    match uic.get(..2)? {
        "87" | "86" => Some("FR"),
        "88" => Some("BE"),
        "80" | "81" => Some("DE"),
        "82" => Some("AT"),
        "83" => Some("IT"),
        "84" | "71" => Some("ES"),
        "85" => Some("PT"),
        "70" => Some("GB"),
        "74" => Some("CH"),
        "79" | "78" => Some("NL"),
        "55" => Some("PL"),
        "54" => Some("CZ"),
        "53" => Some("SK"),
        _ => None,
    }
}
