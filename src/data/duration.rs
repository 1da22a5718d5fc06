use chrono::TimeDelta;

use anyhow::{bail, Result};

/// Suffix to seconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, i64)] = &[
    ("min", 60),
    ("ms", 0),
    ("s", 1),
    ("m", 60),
    ("h", 3_600),
    ("d", 86_400),
];

/// Parse window widths like "30s", "10min", "10m", "1h", "2d"
///
/// Widths must be a whole, positive number of seconds.
pub fn parse_width(s: &str) -> Result<TimeDelta> {
    let s = s.trim();

    for (suffix, secs) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            if *secs == 0 {
                bail!("Window width must be at least one second: {}", s);
            }
            let val: i64 = val_str.trim().parse()?;
            if val <= 0 {
                bail!("Window width must be positive: {}", s);
            }
            let Some(width) = val.checked_mul(*secs).and_then(TimeDelta::try_seconds) else {
                bail!("Window width too large: {}", s);
            };
            return Ok(width);
        }
    }

    bail!("Unknown width format: {} (expected e.g. 30s, 10min, 1h, 1d)", s)
}

/// Format a duration for display
pub fn format_duration(d: TimeDelta) -> String {
    let secs = d.num_seconds();
    if secs < 0 {
        return format!("-{}", format_duration(-d));
    }
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (mins, secs) = (rem / 60, rem % 60);
    if days > 0 {
        format!("{}d {:02}h", days, hours)
    } else if hours > 0 {
        format!("{}h {:02}m", hours, mins)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_width("10min").unwrap(), TimeDelta::minutes(10));
        assert_eq!(parse_width("10m").unwrap(), TimeDelta::minutes(10));
    }

    #[test]
    fn test_parse_hours_days_seconds() {
        assert_eq!(parse_width("1h").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_width("2d").unwrap(), TimeDelta::days(2));
        assert_eq!(parse_width(" 30s ").unwrap(), TimeDelta::seconds(30));
    }

    #[test]
    fn test_parse_rejects_bad_widths() {
        assert!(parse_width("500ms").is_err());
        assert!(parse_width("0s").is_err());
        assert!(parse_width("ten minutes").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_widths() {
        // Fits in i64 seconds but not in a TimeDelta
        let err = parse_width("9999999999999999s").unwrap_err().to_string();
        assert!(err.contains("too large"));
        assert!(parse_width("9999999999999999999d").is_err());
        assert!(parse_width("999999999999999d").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::minutes(66)), "1h 06m");
        assert_eq!(format_duration(TimeDelta::seconds(45)), "45s");
        assert_eq!(format_duration(TimeDelta::hours(30)), "1d 06h");
        assert_eq!(format_duration(TimeDelta::seconds(61)), "1m 01s");
    }
}
