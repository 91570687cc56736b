//! Feature normalization shared by every side of a comparison

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading four-digit year, followed by a non-digit or the end of input
static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{4})(?:\D|$)").unwrap());

/// Trailing tokens stripped from category tags ("Science fiction films")
const FILM_SUFFIXES: [&str; 2] = ["film", "films"];

/// Prefix of the decade feature label
pub const DECADE_LABEL_PREFIX: &str = "decade_";

/// Normalizes a free-text category tag into a feature label
///
/// Lower-cases, drops a trailing `film`/`films` token and collapses
/// whitespace. Returns `None` when nothing meaningful remains.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let lowered = tag.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();

    if tokens
        .last()
        .is_some_and(|last| FILM_SUFFIXES.contains(last))
    {
        tokens.pop();
    }

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Extracts the release year from a date string such as `2025` or `2025-03-14`
pub fn extract_year(date: &str) -> Option<i32> {
    YEAR_PATTERN
        .captures(date)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First year of the decade containing `year`
pub fn decade_start(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Feature label for the decade bucket of `year`
pub fn decade_label(year: i32) -> String {
    format!("{}{}", DECADE_LABEL_PREFIX, decade_start(year))
}
