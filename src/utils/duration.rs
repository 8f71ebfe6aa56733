//! Duration parsing utilities.
//!
//! Parses duration strings such as "500ms", "30s" or "5m" from the
//! configuration file into [`Duration`] values.

use std::time::Duration;

/// Parse a duration string (e.g. "500ms", "30s", "5m", "1h") into a [`Duration`]
///
/// Supported formats:
/// - Raw seconds: "30"
/// - Milliseconds: "500ms", "500msec", "500millis"
/// - Seconds: "30s", "30sec", "30secs", "30second", "30seconds"
/// - Minutes: "5m", "5min", "5mins", "5minute", "5minutes"
/// - Hours: "1h", "1hr", "1hrs", "1hour", "1hours"
///
/// # Examples
/// ```
/// use idstestbed::utils::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30"), Ok(Duration::from_secs(30)));
/// assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
/// assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
/// assert!(parse_duration("invalid").is_err());
/// ```
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let duration = duration.trim();

    // Milliseconds go first, "ms" would otherwise be read as seconds
    if has_suffix(duration, &["millis", "msec", "ms"]) {
        if let Ok(millis) = extract_number_part(duration).parse::<u64>() {
            return Ok(Duration::from_millis(millis));
        }
    }

    if has_suffix(duration, &["hours", "hour", "hrs", "hr", "h"]) {
        if let Ok(hours) = extract_number_part(duration).parse::<u64>() {
            return scaled_seconds(hours, 3600, duration);
        }
    }

    if has_suffix(duration, &["minutes", "minute", "mins", "min", "m"]) {
        if let Ok(minutes) = extract_number_part(duration).parse::<u64>() {
            return scaled_seconds(minutes, 60, duration);
        }
    }

    if has_suffix(duration, &["seconds", "second", "secs", "sec", "s"]) {
        if let Ok(seconds) = extract_number_part(duration).parse::<u64>() {
            return Ok(Duration::from_secs(seconds));
        }
    }

    // Only try raw seconds parsing if no unit suffix is found
    if let Ok(seconds) = duration.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    Err(format!("Invalid duration format: {}", duration))
}

fn scaled_seconds(value: u64, unit: u64, duration: &str) -> Result<Duration, String> {
    value
        .checked_mul(unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Duration out of range: {}", duration))
}

/// Whether `duration` is a number followed by exactly one of `suffixes`
fn has_suffix(duration: &str, suffixes: &[&str]) -> bool {
    let unit = &duration[extract_number_part(duration).len()..];
    suffixes.contains(&unit)
}

/// Extract the numeric part from a duration string by finding the first non-digit character
fn extract_number_part(duration: &str) -> &str {
    match duration.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => &duration[..i],
        None => duration,
    }
}
