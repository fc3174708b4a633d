use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_MONTH: i64 = 2_629_743;
const SECONDS_PER_YEAR: i64 = 31_556_926;

const UNITS: [(i64, &str); 5] = [
    (SECONDS_PER_YEAR, "year"),
    (SECONDS_PER_MONTH, "month"),
    (SECONDS_PER_DAY, "day"),
    (SECONDS_PER_HOUR, "hour"),
    (SECONDS_PER_MINUTE, "minute"),
];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unrecognised date '{0}'")]
pub struct TimeSinceError(String);

/// Accepts RFC 3339, RFC 2822, ISO-8601 without zone (`T` or space
/// separated) and bare dates. Zone-less values are taken as UTC.
pub fn parse_date(date: &str) -> Result<DateTime<Utc>, TimeSinceError> {
    let date = date.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(date) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(nd) = NaiveDateTime::parse_from_str(date, format) {
            return Ok(nd.and_utc());
        }
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|nd| nd.and_utc())
        .ok_or_else(|| TimeSinceError(date.to_string()))
}

fn format_ago(count: i64, unit: &str) -> String {
    let plural = if count > 1 { "s" } else { "" };
    format!("{} {}{} ago", count, unit, plural)
}

/// Largest whole unit elapsed between `then` and `now`, e.g. `3 days ago`.
/// Times in the future count as zero seconds.
pub fn time_since_at(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    UNITS
        .iter()
        .find(|(unit_seconds, _)| seconds >= *unit_seconds)
        .map(|(unit_seconds, unit)| format_ago(seconds / unit_seconds, unit))
        .unwrap_or_else(|| format_ago(seconds, "second"))
}

pub fn time_since(date: &str) -> Result<String, TimeSinceError> {
    Ok(time_since_at(parse_date(date)?, Utc::now()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ago(seconds: i64) -> String {
        time_since_at(now() - Duration::seconds(seconds), now())
    }

    #[test]
    fn picks_largest_unit() {
        assert_eq!(ago(30), "30 seconds ago");
        assert_eq!(ago(90), "1 minute ago");
        assert_eq!(ago(2 * SECONDS_PER_DAY), "2 days ago");
        assert_eq!(ago(3 * SECONDS_PER_HOUR + 59), "3 hours ago");
        assert_eq!(ago(SECONDS_PER_MONTH), "1 month ago");
        assert_eq!(ago(2 * SECONDS_PER_YEAR + 5), "2 years ago");
    }

    #[test]
    fn singular_for_one_and_zero() {
        assert_eq!(ago(1), "1 second ago");
        assert_eq!(ago(0), "0 second ago");
    }

    #[test]
    fn future_dates_are_zero_seconds() {
        assert_eq!(ago(-120), "0 second ago");
    }

    #[test]
    fn parses_common_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 30, 8, 15, 0).unwrap();

        assert_eq!(parse_date("2024-05-30T08:15:00Z"), Ok(expected));
        assert_eq!(parse_date("2024-05-30T10:15:00+02:00"), Ok(expected));
        assert_eq!(parse_date("2024-05-30 08:15:00"), Ok(expected));
        assert_eq!(parse_date("Thu, 30 May 2024 08:15:00 +0000"), Ok(expected));
        assert_eq!(
            parse_date("2024-05-30"),
            Ok(Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_date("yesterday-ish"),
            Err(TimeSinceError("yesterday-ish".to_string()))
        );
        assert!(time_since("").is_err());
    }

    #[test]
    fn time_since_uses_current_time() {
        let ninety_seconds_ago = (Utc::now() - Duration::seconds(90)).to_rfc3339();

        assert_eq!(time_since(&ninety_seconds_ago).unwrap(), "1 minute ago");
    }
}
