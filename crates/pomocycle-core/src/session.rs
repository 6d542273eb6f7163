//! Session records, feedback, and weekly buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::format_clock;

/// Feedback rating, 1 through 10 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        Self::try_from(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::RatingOutOfRange { value })
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidRating {
                input: s.to_string(),
            })?;
        Self::new(value)
    }
}

/// How focused the user felt during a work phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowState {
    Distracted,
    Engaged,
    Flow,
}

impl FromStr for FlowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distracted" | "d" => Ok(Self::Distracted),
            "engaged" | "e" => Ok(Self::Engaged),
            "flow" | "f" => Ok(Self::Flow),
            other => Err(format!(
                "unknown flow state '{other}' (expected distracted, engaged or flow)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkFeedback {
    pub time_rating: Rating,
    pub flow_state: Option<FlowState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakFeedback {
    pub refresh_rating: Rating,
}

/// One phase of a completed work/break pair.
///
/// `feedback` is always written; `null` means the user skipped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord<F> {
    pub start_date_time: DateTime<Utc>,
    pub elapsed_secs: u64,
    pub elapsed_time: String,
    pub feedback: Option<F>,
}

impl<F> PhaseRecord<F> {
    pub fn new(start: DateTime<Utc>, elapsed_secs: u64, feedback: Option<F>) -> Self {
        Self {
            start_date_time: start,
            elapsed_secs,
            elapsed_time: format_clock(elapsed_secs),
            feedback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub work: PhaseRecord<WorkFeedback>,
    #[serde(rename = "break")]
    pub break_phase: PhaseRecord<BreakFeedback>,
    /// Stamped by the store on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(work: PhaseRecord<WorkFeedback>, break_phase: PhaseRecord<BreakFeedback>) -> Self {
        Self {
            work,
            break_phase,
            saved_at: None,
        }
    }

    /// Bucket this record lands in, keyed on the work start.
    pub fn week_bucket(&self) -> WeekBucket {
        WeekBucket::from_datetime(self.work.start_date_time)
    }
}

/// ISO-8601 week key, e.g. `2024-week07`.
///
/// Weeks follow the user's local calendar date, so a session started late on
/// Sunday evening stays in that week.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekBucket(String);

impl WeekBucket {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self::from_datetime_in(at, &Local)
    }

    /// Bucket for `at` as seen on the calendar of `tz`.
    pub fn from_datetime_in<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> Self {
        let week = at.with_timezone(tz).date_naive().iso_week();
        Self(format!("{}-week{:02}", week.year(), week.week()))
    }

    pub fn current() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeekBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WeekBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid week '{s}' (expected YYYY-weekWW)");
        let (year, week) = s.split_once("-week").ok_or_else(invalid)?;
        let year_ok = year.len() == 4 && year.chars().all(|c| c.is_ascii_digit());
        let week_digits = week.len() == 2 && week.chars().all(|c| c.is_ascii_digit());
        let week_num = week
            .parse::<u32>()
            .ok()
            .filter(|w| week_digits && (1..=53).contains(w));
        match (year_ok, week_num) {
            (true, Some(_)) => Ok(Self(s.to_string())),
            _ => Err(invalid()),
        }
    }
}

/// Free-form feedback about a whole schedule run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFeedbackRecord {
    pub schedule_id: String,
    pub feedback: String,
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(11).is_err());
        assert_eq!(Rating::new(1).unwrap().value(), 1);
        assert_eq!("10".parse::<Rating>().unwrap().value(), 10);
        assert!("ten".parse::<Rating>().is_err());
    }

    #[test]
    fn rating_parse_error_keeps_input() {
        let err = "ten".parse::<Rating>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidRating {
                input: "ten".to_string()
            }
        );
        assert!(err.to_string().contains("'ten'"));
        assert_eq!(
            "11".parse::<Rating>().unwrap_err(),
            ValidationError::RatingOutOfRange { value: 11 }
        );
    }

    #[test]
    fn rating_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("7").is_ok());
        assert!(serde_json::from_str::<Rating>("42").is_err());
    }

    #[test]
    fn week_bucket_uses_iso_weeks() {
        // 2021-01-01 is a Friday and belongs to ISO week 53 of 2020.
        let at = Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(WeekBucket::from_datetime_in(at, &Utc).as_str(), "2020-week53");

        // 2024-12-30 is a Monday in ISO week 1 of 2025.
        let at = Utc.with_ymd_and_hms(2024, 12, 30, 8, 0, 0).unwrap();
        assert_eq!(WeekBucket::from_datetime_in(at, &Utc).as_str(), "2025-week01");

        let at = Utc.with_ymd_and_hms(2024, 2, 14, 9, 0, 0).unwrap();
        assert_eq!(WeekBucket::from_datetime(at).as_str(), "2024-week07");
    }

    #[test]
    fn week_bucket_follows_local_calendar_date() {
        // Monday 04:00 UTC is still Sunday evening in UTC-8.
        let at = Utc.with_ymd_and_hms(2024, 2, 19, 4, 0, 0).unwrap();
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(WeekBucket::from_datetime_in(at, &pacific).as_str(), "2024-week07");
        assert_eq!(WeekBucket::from_datetime_in(at, &Utc).as_str(), "2024-week08");

        // Sunday 23:30 UTC is already Monday in UTC+9.
        let at = Utc.with_ymd_and_hms(2024, 2, 18, 23, 30, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(WeekBucket::from_datetime_in(at, &tokyo).as_str(), "2024-week08");
    }

    #[test]
    fn week_bucket_parse() {
        assert!("2024-week07".parse::<WeekBucket>().is_ok());
        assert!("2024-week7".parse::<WeekBucket>().is_err());
        assert!("2024-week+7".parse::<WeekBucket>().is_err());
        assert!("2024-week54".parse::<WeekBucket>().is_err());
        assert!("../etc".parse::<WeekBucket>().is_err());
    }

    #[test]
    fn skipped_feedback_serializes_as_null() {
        let start = Utc.with_ymd_and_hms(2024, 2, 14, 9, 0, 0).unwrap();
        let record = SessionRecord::new(
            PhaseRecord::new(start, 1500, None),
            PhaseRecord::new(start, 300, None),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["work"]["feedback"].is_null());
        assert!(json["break"]["feedback"].is_null());
        assert!(json["work"].as_object().unwrap().contains_key("feedback"));
        assert_eq!(json["work"]["elapsedTime"], "25:00");
        assert_eq!(json["break"]["elapsedSecs"], 300);
    }

    #[test]
    fn work_feedback_shape() {
        let feedback = WorkFeedback {
            time_rating: Rating::new(8).unwrap(),
            flow_state: Some(FlowState::Flow),
        };
        let json = serde_json::to_value(feedback).unwrap();
        assert_eq!(json["timeRating"], 8);
        assert_eq!(json["flowState"], "flow");
    }

    #[test]
    fn flow_state_parse() {
        assert_eq!("Engaged".parse::<FlowState>().unwrap(), FlowState::Engaged);
        assert_eq!("d".parse::<FlowState>().unwrap(), FlowState::Distracted);
        assert!("zen".parse::<FlowState>().is_err());
    }
}
