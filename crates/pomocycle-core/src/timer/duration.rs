use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Phase;
use crate::error::ValidationError;

/// Length of one phase as entered by the user.
///
/// Stored as separate minute and second fields so a preset reloads with
/// exactly the values it was saved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseDuration {
    pub minutes: u32,
    pub seconds: u32,
}

impl PhaseDuration {
    pub const fn new(minutes: u32, seconds: u32) -> Self {
        Self { minutes, seconds }
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self::new(minutes, 0)
    }

    pub fn total_secs(&self) -> u64 {
        u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    /// Reject zero-length phases and second fields outside `0..60`.
    pub fn validate(&self, phase: Phase) -> Result<(), ValidationError> {
        if self.seconds >= 60 {
            return Err(ValidationError::SecondsOutOfRange {
                value: self.seconds,
            });
        }
        if self.is_zero() {
            return Err(ValidationError::ZeroDuration { phase });
        }
        Ok(())
    }
}

impl fmt::Display for PhaseDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Accepts `MM:SS` or a bare minute count (`25`).
impl FromStr for PhaseDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || ValidationError::InvalidDuration {
            input: s.to_string(),
        };

        match input.split_once(':') {
            Some((min, sec)) => {
                let minutes = min.trim().parse::<u32>().map_err(|_| invalid())?;
                let seconds = sec.trim().parse::<u32>().map_err(|_| invalid())?;
                Ok(Self::new(minutes, seconds))
            }
            None => input
                .parse::<u32>()
                .map(Self::from_minutes)
                .map_err(|_| invalid()),
        }
    }
}

/// Format a second count as `MM:SS`. Minutes are not wrapped at 60.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!("25:00".parse::<PhaseDuration>().unwrap(), PhaseDuration::new(25, 0));
        assert_eq!("0:45".parse::<PhaseDuration>().unwrap(), PhaseDuration::new(0, 45));
        assert_eq!(" 90 ".parse::<PhaseDuration>().unwrap(), PhaseDuration::new(90, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!("abc".parse::<PhaseDuration>().is_err());
        assert!("1:xx".parse::<PhaseDuration>().is_err());
        assert!("-5".parse::<PhaseDuration>().is_err());
    }

    #[test]
    fn zero_duration_is_invalid() {
        let err = PhaseDuration::new(0, 0).validate(Phase::Work).unwrap_err();
        assert_eq!(err, ValidationError::ZeroDuration { phase: Phase::Work });
    }

    #[test]
    fn seconds_must_stay_below_sixty() {
        assert!(PhaseDuration::new(1, 60).validate(Phase::Break).is_err());
        assert!(PhaseDuration::new(0, 59).validate(Phase::Break).is_ok());
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(90 * 60), "90:00");
        assert_eq!(PhaseDuration::new(5, 3).to_string(), "05:03");
    }
}
