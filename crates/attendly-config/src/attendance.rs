//! Calendar settings for the attendance engine.
//!
//! "Today" drives the roster's current status, the default date of a bulk
//! mark, and the end of the seven-day trend. It is computed in the
//! institution's fixed UTC offset rather than the server's clock zone.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::env_parse;

pub const DEFAULT_TOP_ABSENT_LIMIT: i64 = 10;

#[derive(Clone, Debug)]
pub struct AttendanceConfig {
    /// Offset from UTC in minutes, e.g. 360 for UTC+6.
    pub utc_offset_minutes: i32,
    pub top_absent_limit: i64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            top_absent_limit: DEFAULT_TOP_ABSENT_LIMIT,
        }
    }
}

impl AttendanceConfig {
    pub fn from_env() -> Self {
        Self {
            utc_offset_minutes: env_parse("ATTENDANCE_TIMEZONE_OFFSET_MINUTES").unwrap_or(0),
            top_absent_limit: env_parse::<i64>("ATTENDANCE_TOP_ABSENT_LIMIT")
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_TOP_ABSENT_LIMIT),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offset_is_utc() {
        let config = AttendanceConfig::default();
        assert_eq!(config.offset().local_minus_utc(), 0);
        assert_eq!(config.top_absent_limit, 10);
    }

    #[test]
    fn test_positive_offset() {
        let config = AttendanceConfig {
            utc_offset_minutes: 360,
            ..Default::default()
        };
        assert_eq!(config.offset().local_minus_utc(), 6 * 3600);
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let config = AttendanceConfig {
            utc_offset_minutes: 24 * 60 + 1,
            ..Default::default()
        };
        assert_eq!(config.offset().local_minus_utc(), 0);
    }
}
