//! Gust extraction from METAR / TAF wind groups

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Wind group with a gust suffix, e.g. `18015G25KT` or `VRB08G15KT`.
///
/// Captures:
/// - Group 1: direction (three digits or `VRB`)
/// - Group 2: sustained speed
/// - Group 3: gust speed
fn gust_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([0-9]{3}|VRB)([0-9]{2,3})G([0-9]{2,3})KT").unwrap())
}

fn first_gust_group(text: &str) -> Option<Captures<'_>> {
    gust_pattern().captures(text)
}

/// Gust speed in knots from the first gusting wind group in `text`.
///
/// `None` means no gust was reported, which is distinct from a zero gust.
#[must_use]
pub fn extract_gust(text: &str) -> Option<u32> {
    first_gust_group(text)?.get(3)?.as_str().parse().ok()
}

/// Gust speed minus sustained speed from the first gusting wind group.
#[must_use]
pub fn extract_gust_factor(text: &str) -> Option<u32> {
    let captures = first_gust_group(text)?;
    let sustained: u32 = captures.get(2)?.as_str().parse().ok()?;
    let gust: u32 = captures.get(3)?.as_str().parse().ok()?;
    Some(gust.saturating_sub(sustained))
}
