//! Tolerant date parsing for standardisation.

use chrono::{NaiveDate, NaiveDateTime};

/// Date-only formats accepted by the ISO 8601 standardiser, tried in order.
const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",  // 15-Jan-2024
    "%b %d, %Y", // Jan 15, 2024
    "%d %b %Y",  // 15 Jan 2024
    "%Y%m%d",    // 20240115
];

/// Datetime formats accepted by the standardiser; the time part is dropped.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Parses any recognised date format into a date.
pub fn parse_flexible(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(datetime.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    None
}

/// Formats a date in the canonical `YYYY-MM-DD` form.
pub fn format_iso8601(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_formats_parse() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        for input in [
            "2024-01-15",
            "2024/01/15",
            "15/01/2024",
            "01-15-2024",
            "15-Jan-2024",
            "Jan 15, 2024",
            "20240115",
            "2024-01-15 10:30:00",
        ] {
            assert_eq!(parse_flexible(input), Some(expected), "{input}");
        }
    }

    #[test]
    fn garbage_does_not_parse() {
        assert_eq!(parse_flexible("not a date"), None);
        assert_eq!(parse_flexible(""), None);
    }

    #[test]
    fn canonical_form() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_iso8601(date), "2024-03-07");
    }
}
