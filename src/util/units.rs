//! Units formatting and conversion utilities
//!
//! Durations in configuration are plain milliseconds; on the command line
//! they may also be given in human form such as `"1m 30s"`.

use std::time::Duration;

/// Parse a duration into milliseconds
///
/// Accepts a bare integer (milliseconds) or a humantime expression.
///
/// # Examples
/// ```
/// use perfrun::util::units::parse_millis;
///
/// assert_eq!(parse_millis("250").unwrap(), 250);
/// assert_eq!(parse_millis("2s").unwrap(), 2000);
/// assert_eq!(parse_millis("1m 30s").unwrap(), 90_000);
/// ```
pub fn parse_millis(input: &str) -> Result<u64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Empty duration".to_string());
    }

    if let Ok(millis) = input.parse::<u64>() {
        return Ok(millis);
    }

    let duration = humantime::parse_duration(input)
        .map_err(|e| format!("Invalid duration '{}': {}", input, e))?;
    u64::try_from(duration.as_millis()).map_err(|_| format!("Duration too long: {}", input))
}

/// Format a duration for display
///
/// Sub-second durations are shown in milliseconds, longer ones in
/// humantime notation truncated to whole milliseconds.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        return format!("{}ms", duration.as_millis());
    }
    let truncated = Duration::from_millis(duration.as_millis() as u64);
    humantime::format_duration(truncated).to_string()
}

/// Format a single latency with microsecond resolution
pub fn format_latency(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1000 {
        let millis = micros as f64 / 1000.0;
        format!("{:.2}ms", millis)
    } else {
        format!("{}μs", micros)
    }
}

/// Invocations per second
pub fn calculate_throughput(invocations: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        invocations as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("0").unwrap(), 0);
        assert_eq!(parse_millis(" 1500 ").unwrap(), 1500);
        assert_eq!(parse_millis("500ms").unwrap(), 500);
        assert_eq!(parse_millis("3s").unwrap(), 3000);
        assert_eq!(parse_millis("1h").unwrap(), 3_600_000);
        assert!(parse_millis("").is_err());
        assert!(parse_millis("soon").is_err());
        assert!(parse_millis("-5").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s 500ms");
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(Duration::from_micros(500)), "500μs");
        assert_eq!(format_latency(Duration::from_micros(1500)), "1.50ms");
    }

    #[test]
    fn test_calculate_throughput() {
        assert_eq!(calculate_throughput(100, Duration::from_secs(2)), 50.0);
        assert_eq!(calculate_throughput(100, Duration::ZERO), 0.0);
    }
}
