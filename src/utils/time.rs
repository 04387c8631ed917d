// src/utils/time.rs - Cross-platform time utilities

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Cross-platform time utilities that work on both native and WASM
pub struct Time;

impl Time {
    /// Current UTC time on both native and WASM
    pub fn now() -> DateTime<Utc> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Utc::now()
        }

        #[cfg(target_arch = "wasm32")]
        {
            let millis = js_sys::Date::now() as i64;
            DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
        }
    }

    /// Current timestamp as milliseconds since epoch
    pub fn now_millis() -> u64 {
        Self::now().timestamp_millis().max(0) as u64
    }

    pub fn duration_millis(millis: i64) -> Duration {
        Duration::milliseconds(millis)
    }

    /// First instant of `date` (00:00:00.000 UTC).
    pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
    }

    /// Calendar day of a timestamp in the offset it was written with. Naive
    /// stamps and bare dates are taken as-is.
    pub fn local_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.date());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Parses the timestamp formats the server emits: RFC 3339, a naive
    /// `YYYY-MM-DDTHH:MM:SS` or a bare date.
    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(Self::start_of_day)
    }

    /// `dd.mm.yyyy` rendering used by the listing pages.
    pub fn format_date(value: &DateTime<Utc>) -> String {
        value.format("%d.%m.%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Time::start_of_day(date).to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_local_date_keeps_offset() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10);
        assert_eq!(Time::local_date("2024-03-10T01:00:00+03:00"), day);
        assert_eq!(Time::local_date("2024-03-10T23:30:00-05:00"), day);
        assert_eq!(Time::local_date("2024-03-10T00:00:00Z"), day);
        assert_eq!(Time::local_date("2024-03-10T08:15:00"), day);
        assert_eq!(Time::local_date("2024-03-10"), day);
        assert_eq!(Time::local_date("garbage"), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(Time::parse_timestamp("2024-03-01T10:00:00Z").is_some());
        assert!(Time::parse_timestamp("2024-03-01T10:00:00.123456").is_some());
        assert_eq!(
            Time::parse_timestamp("2024-03-01").map(|d| d.date_naive()),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(Time::parse_timestamp("").is_none());
        assert!(Time::parse_timestamp("yesterday").is_none());
    }
}
