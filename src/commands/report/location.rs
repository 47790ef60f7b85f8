use std::cmp::Ordering;

use anyhow::{Context, Result};
use regex::Regex;

/// Prefix added to shelf locations that are printed as a bare number.
pub const SHELF_PREFIX: &str = "S-";

/// Canonical form of a raw emplacement: bare numbers get the shelf prefix, and a
/// two-word zone/number pair is collapsed into one token.
///
/// `"12 A"` becomes `"S-12A"` and `"X 5"` becomes `"X5"`. Applying it twice is a no-op:
/// the first step never fires on an output (it starts with `S`, or was already a
/// non-digit), and the second only fires on two words while its output is one.
pub fn normalize_location(raw: &str) -> String {
    let mut value = raw.to_string();

    let starts_with_digit = raw
        .trim_start()
        .chars()
        .next()
        .is_some_and(|character| character.is_ascii_digit());
    if starts_with_digit {
        value = format!("{SHELF_PREFIX}{}", raw.trim_start());
    }

    let words = value.split_whitespace().collect::<Vec<&str>>();
    if words.len() == 2 {
        value = words.concat();
    }

    value
}

/// Sort key of a normalized location.
///
/// Locations made of a letter run followed by a digit run (`X12`, `AB7-3`) compare by
/// `(letters, number)`; anything else compares as `(whole text, 0)`. Both shapes share
/// that single `(text, number)` order, so `S-12A` lands among the `S…` codes. On a full
/// tie a coded key sorts before a raw one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationKey {
    Coded { prefix: String, digits: String },
    Raw(String),
}

impl LocationKey {
    fn text(&self) -> &str {
        match self {
            Self::Coded { prefix, .. } => prefix,
            Self::Raw(text) => text,
        }
    }

    fn digits(&self) -> &str {
        match self {
            Self::Coded { digits, .. } => digits,
            Self::Raw(_) => "",
        }
    }

    fn shape_rank(&self) -> u8 {
        match self {
            Self::Coded { .. } => 0,
            Self::Raw(_) => 1,
        }
    }
}

impl Ord for LocationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text()
            .cmp(other.text())
            .then_with(|| compare_digit_runs(self.digits(), other.digits()))
            .then_with(|| self.shape_rank().cmp(&other.shape_rank()))
    }
}

impl PartialOrd for LocationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two digit strings without leading zeros by numeric value, of any length.
fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

/// Builds [`LocationKey`]s. One keyer is created per report run.
#[derive(Debug, Clone)]
pub struct LocationKeyer {
    pattern: Regex,
}

impl LocationKeyer {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^([A-Za-z]+)([0-9]+)")
            .context("failed to compile location key regex")?;
        Ok(Self { pattern })
    }

    pub fn key(&self, location: &str) -> LocationKey {
        let Some(captures) = self.pattern.captures(location) else {
            return LocationKey::Raw(location.to_string());
        };

        match (captures.get(1), captures.get(2)) {
            (Some(prefix), Some(digits)) => LocationKey::Coded {
                prefix: prefix.as_str().to_string(),
                digits: digits.as_str().trim_start_matches('0').to_string(),
            },
            _ => LocationKey::Raw(location.to_string()),
        }
    }
}
