//! Human-readable distance and duration strings.

/// Format a distance in meters.
///
/// Below one kilometre the value is rounded to whole meters (`"842m"`),
/// otherwise shown in kilometres with two decimals (`"1.25km"`).
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round())
    } else {
        format!("{:.2}km", meters / 1000.0)
    }
}

/// Format a duration in whole seconds.
///
/// Only the two most significant units are shown: `"1h 5m"`, `"3m 20s"`,
/// `"45s"`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(842.4), "842m");
        assert_eq!(format_distance(999.4), "999m");
        assert_eq!(format_distance(1000.0), "1.00km");
        assert_eq!(format_distance(1234.5), "1.23km");
        assert_eq!(format_distance(12_340.0), "12.34km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(200), "3m 20s");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3905), "1h 5m");
    }
}
