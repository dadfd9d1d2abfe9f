use chrono::{DateTime, Utc};

/// Convert Unix timestamp to formatted string
pub fn format_timestamp(timestamp: Option<i64>) -> Option<String> {
    timestamp.and_then(|ts| {
        let dt = DateTime::<Utc>::from_timestamp(ts, 0)?;
        Some(dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    })
}

/// Same as [`format_timestamp`] for providers that send Unix time as a string.
/// `"0"` means "never" and renders as `None`.
pub fn format_timestamp_str(timestamp: Option<&str>) -> Option<String> {
    let ts = timestamp?.trim().parse::<i64>().ok()?;
    if ts == 0 {
        return None;
    }
    format_timestamp(Some(ts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_valid() {
        let formatted = format_timestamp(Some(1609459200));
        assert_eq!(formatted, Some("2021-01-01 00:00:00 UTC".to_string()));
    }

    #[test]
    fn test_format_timestamp_none() {
        assert_eq!(format_timestamp(None), None);
    }

    #[test]
    fn test_format_timestamp_str() {
        assert_eq!(
            format_timestamp_str(Some("1609459200")),
            Some("2021-01-01 00:00:00 UTC".to_string())
        );
        assert_eq!(format_timestamp_str(Some("0")), None);
        assert_eq!(format_timestamp_str(Some("soon")), None);
        assert_eq!(format_timestamp_str(None), None);
    }
}
