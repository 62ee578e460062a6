//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds
//! precision. Lifecycle columns (`created_at`, `updated_at`,
//! `deleted_at`, `govbr_last_validated_at`) all flow through this type,
//! so every timestamp the API emits renders as `YYYY-MM-DDTHH:MM:SSZ`
//! regardless of the server's locale.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::ActionError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string, accepting any offset and converting to
    /// UTC.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the string is not valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ActionError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ActionError::validation_msg(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO 8601 with Z suffix (e.g., `2026-03-01T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Render as the short Brazilian date form, `dd/MM/yyyy`.
    pub fn to_br_date(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }

    /// Render as the long Brazilian date form used in signature blocks,
    /// `dd de <month> de yyyy` (e.g., `01 de março de 2026`).
    pub fn to_br_long_date(&self) -> String {
        use chrono::Datelike;

        const MONTHS: [&str; 12] = [
            "janeiro",
            "fevereiro",
            "março",
            "abril",
            "maio",
            "junho",
            "julho",
            "agosto",
            "setembro",
            "outubro",
            "novembro",
            "dezembro",
        ];
        format!(
            "{:02} de {} de {}",
            self.0.day(),
            MONTHS[self.0.month0() as usize],
            self.0.year()
        )
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(987_654_321).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-03-01T12:30:45Z");
    }

    #[test]
    fn test_parse_converts_offset_to_utc() {
        let ts = Timestamp::parse("2026-03-01T09:00:00-03:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-01T12:00:00Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2026-03-01").is_err());
    }

    #[test]
    fn test_br_date_format() {
        let ts = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        assert_eq!(ts.to_br_date(), "01/03/2026");
    }

    #[test]
    fn test_br_long_date_format() {
        let ts = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        assert_eq!(ts.to_br_long_date(), "01 de março de 2026");
        let dec = Timestamp::parse("2025-12-25T00:00:00Z").unwrap();
        assert_eq!(dec.to_br_long_date(), "25 de dezembro de 2025");
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        let later = Timestamp::parse("2026-03-01T12:00:01Z").unwrap();
        assert!(earlier < later);
    }
}
