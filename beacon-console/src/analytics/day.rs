use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;

/// Calendar day a raw backend timestamp falls on.
///
/// Instants (RFC 3339 with an offset, or RFC 2822 as emitted by some HTTP
/// backends) are converted into `tz` first. Civil datetimes without an
/// offset are taken as device-local and keep their written date. Anything
/// else is rejected.
pub fn day_of(raw: &str, tz: &TimeZone) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts.to_zoned(tz.clone()).date());
    }

    if let Ok(zoned) = jiff::fmt::rfc2822::parse(raw) {
        return Some(zoned.timestamp().to_zoned(tz.clone()).date());
    }

    if let Ok(dt) = raw.parse::<DateTime>() {
        return Some(dt.date());
    }

    raw.parse::<Date>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_backend_formats() {
        let utc = TimeZone::UTC;
        let expected: Date = "2024-02-29".parse().unwrap();

        assert_eq!(day_of("2024-02-29T23:00:00.000Z", &utc), Some(expected));
        assert_eq!(day_of("2024-03-01T01:00:00+03:00", &utc), Some(expected));
        assert_eq!(day_of("Thu, 29 Feb 2024 10:00:00 GMT", &utc), Some(expected));
        assert_eq!(day_of("2024-02-29 10:00:00", &utc), Some(expected));
        assert_eq!(day_of("2024-02-29", &utc), Some(expected));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(day_of("Invalid Date", &TimeZone::UTC), None);
        assert_eq!(day_of("   ", &TimeZone::UTC), None);
        assert_eq!(day_of("2024-02-30T00:00:00Z", &TimeZone::UTC), None);
    }
}
