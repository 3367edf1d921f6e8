use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::AppError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timezone used to render usage-log timestamps
#[derive(Debug, Clone, Copy)]
pub(crate) enum Timezone {
    Local,
    Named(Tz),
}

impl Timezone {
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = value else {
            return Ok(Timezone::Local);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Timezone::Named(chrono_tz::UTC));
        }
        Tz::from_str(trimmed)
            .map(Timezone::Named)
            .map_err(|_| AppError::InvalidTimezone {
                input: trimmed.to_string(),
            })
    }

    /// Render a unix timestamp (seconds); `None` for out-of-range values
    pub(crate) fn format_unix(self, secs: i64) -> Option<String> {
        let utc = DateTime::<Utc>::from_timestamp(secs, 0)?;
        let rendered = match self {
            Timezone::Local => utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
            Timezone::Named(tz) => utc.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
        };
        Some(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_none_and_empty_return_local() {
        assert!(matches!(Timezone::parse(None).unwrap(), Timezone::Local));
        assert!(matches!(Timezone::parse(Some("  ")).unwrap(), Timezone::Local));
        assert!(matches!(Timezone::parse(Some("LOCAL")).unwrap(), Timezone::Local));
    }

    #[test]
    fn parse_utc_variants() {
        for raw in ["utc", "UTC", "z", " Z "] {
            assert!(matches!(
                Timezone::parse(Some(raw)).unwrap(),
                Timezone::Named(chrono_tz::UTC)
            ));
        }
    }

    #[test]
    fn parse_named_timezone() {
        let tz = Timezone::parse(Some("Asia/Shanghai")).unwrap();
        assert!(matches!(tz, Timezone::Named(chrono_tz::Asia::Shanghai)));
    }

    #[test]
    fn parse_invalid_timezone_returns_error() {
        let err = Timezone::parse(Some("Mars/Olympus")).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn format_unix_in_utc() {
        let tz = Timezone::Named(chrono_tz::UTC);
        assert_eq!(
            tz.format_unix(1_760_000_000).as_deref(),
            Some("2025-10-09 08:53:20")
        );
    }

    #[test]
    fn format_unix_shifts_named_zone() {
        let tz = Timezone::parse(Some("Asia/Shanghai")).unwrap();
        assert_eq!(
            tz.format_unix(1_760_000_000).as_deref(),
            Some("2025-10-09 16:53:20")
        );
    }
}
