//! Schedule expressions: `at(...)`, `rate(...)` and `cron(...)`.

use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

pub const AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Longest interval a chrono `TimeDelta` (millisecond precision) can hold.
const MAX_RATE_SECONDS: u64 = i64::MAX.unsigned_abs() / 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Unsupported schedule expression: {0}")]
    Unsupported(String),

    #[error("Invalid date in {0}")]
    InvalidDate(String),

    #[error("Rate must be positive: {0}")]
    ZeroRate(String),

    #[error("Rate is too large: {0}")]
    RateOverflow(String),

    #[error("Cron expression needs 6 fields: {0}")]
    CronFields(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleExpression {
    /// One-shot at a UTC instant.
    At(NaiveDateTime),
    Rate(Duration),
    /// `min hour dom month dow year`.
    Cron {
        fields: [String; 5],
        year: Option<i32>,
    },
}

fn at_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^at\((\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})\)$").expect("valid regex"))
}

fn rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rate\((\d+)\s+(minute|minutes|hour|hours|day|days)\)$").expect("valid regex")
    })
}

fn cron_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^cron\((.+)\)$").expect("valid regex"))
}

impl ScheduleExpression {
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let expression = expression.trim();

        if let Some(caps) = at_regex().captures(expression) {
            let at = NaiveDateTime::parse_from_str(&caps[1], AT_FORMAT)
                .map_err(|_| ExpressionError::InvalidDate(expression.to_string()))?;
            return Ok(Self::At(at));
        }

        if let Some(caps) = rate_regex().captures(expression) {
            let amount: u64 = caps[1]
                .parse()
                .map_err(|_| ExpressionError::Unsupported(expression.to_string()))?;
            if amount == 0 {
                return Err(ExpressionError::ZeroRate(expression.to_string()));
            }
            let unit: u64 = match &caps[2] {
                "minute" | "minutes" => 60,
                "hour" | "hours" => 60 * 60,
                _ => 24 * 60 * 60,
            };
            let seconds = amount
                .checked_mul(unit)
                .filter(|secs| *secs <= MAX_RATE_SECONDS)
                .ok_or_else(|| ExpressionError::RateOverflow(expression.to_string()))?;
            return Ok(Self::Rate(Duration::from_secs(seconds)));
        }

        if let Some(caps) = cron_regex().captures(expression) {
            let parts: Vec<&str> = caps[1].split_whitespace().collect();
            let [minute, hour, dom, month, dow, year] = parts.as_slice() else {
                return Err(ExpressionError::CronFields(expression.to_string()));
            };
            let year = match *year {
                "*" | "?" => None,
                value => Some(
                    value
                        .parse()
                        .map_err(|_| ExpressionError::Unsupported(expression.to_string()))?,
                ),
            };
            return Ok(Self::Cron {
                fields: [minute, hour, dom, month, dow].map(ToString::to_string),
                year,
            });
        }

        Err(ExpressionError::Unsupported(expression.to_string()))
    }

    /// Expression for a one-shot run at the given instant.
    #[must_use]
    pub fn at(instant: chrono::DateTime<Utc>) -> String {
        format!("at({})", instant.format(AT_FORMAT))
    }

    /// Cron string with a leading seconds field for the job scheduler.
    #[must_use]
    pub fn job_cron(&self) -> Option<String> {
        match self {
            Self::Cron { fields, .. } => Some(format!("0 {}", fields.join(" "))),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_one_shot(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_at() {
        let parsed = ScheduleExpression::parse("at(2022-11-20T13:00:00)").unwrap();
        let expected = NaiveDate::from_ymd_opt(2022, 11, 20)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        assert_eq!(parsed, ScheduleExpression::At(expected));
        assert!(parsed.is_one_shot());
    }

    #[test]
    fn parses_rates() {
        assert_eq!(
            ScheduleExpression::parse("rate(5 minutes)").unwrap(),
            ScheduleExpression::Rate(Duration::from_secs(300))
        );
        assert_eq!(
            ScheduleExpression::parse("rate(1 day)").unwrap(),
            ScheduleExpression::Rate(Duration::from_secs(86_400))
        );
        assert!(matches!(
            ScheduleExpression::parse("rate(0 hours)"),
            Err(ExpressionError::ZeroRate(_))
        ));
    }

    #[test]
    fn oversized_rate_is_an_error() {
        assert!(matches!(
            ScheduleExpression::parse("rate(300000000000000 days)"),
            Err(ExpressionError::RateOverflow(_))
        ));
        assert!(matches!(
            ScheduleExpression::parse("rate(18446744073709551615 minutes)"),
            Err(ExpressionError::RateOverflow(_))
        ));
    }

    #[test]
    fn cron_gets_seconds_prepended() {
        let parsed = ScheduleExpression::parse("cron(15 10 ? * 6L 2022)").unwrap();
        assert_eq!(parsed.job_cron().as_deref(), Some("0 15 10 ? * 6L"));
        assert!(matches!(parsed, ScheduleExpression::Cron { year: Some(2022), .. }));

        assert!(matches!(
            ScheduleExpression::parse("cron(15 10 * *)"),
            Err(ExpressionError::CronFields(_))
        ));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(ScheduleExpression::parse("every(5 minutes)").is_err());
        assert!(ScheduleExpression::parse("rate(5 weeks)").is_err());
        assert!(matches!(
            ScheduleExpression::parse("at(2022-13-40T00:00:00)"),
            Err(ExpressionError::InvalidDate(_))
        ));
    }
}
