//! `xs:dateTime` handling for SAML timestamps.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Formats an instant as UTC with second precision and a `Z` suffix.
#[must_use]
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses an `xs:dateTime` value.
///
/// Values without a zone designator are read as UTC, which is what SAML
/// requires IdPs to send anyway.
#[must_use]
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_z_suffix() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(format_instant(&at), "2024-05-06T07:08:09Z");
    }

    #[test]
    fn parses_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_instant("2024-01-01T01:00:00+01:00"), Some(expected));
        assert_eq!(parse_instant("2024-01-01T00:00:00"), Some(expected));
        assert!(parse_instant("2024-01-01T00:00:00.250Z").is_some());
        assert_eq!(parse_instant("yesterday"), None);
    }
}
