//! Named work/break pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::{Phase, PhaseDuration};

/// A saved work/break pair. Schedules embed copies of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPreset {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub work_timer: PhaseDuration,
    pub break_timer: PhaseDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TimerPreset {
    /// Build and validate a preset. The id is derived from the name.
    pub fn new(
        name: &str,
        work_timer: PhaseDuration,
        break_timer: PhaseDuration,
    ) -> Result<Self, ValidationError> {
        let name = name.trim().to_string();
        let preset = Self {
            id: preset_id_from_name(&name),
            name,
            work_timer,
            break_timer,
            created_at: Some(Utc::now()),
        };
        preset.validate()?;
        Ok(preset)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { what: "timer" });
        }
        self.work_timer.validate(Phase::Work)?;
        self.break_timer.validate(Phase::Break)?;
        Ok(())
    }

    pub fn duration(&self, phase: Phase) -> PhaseDuration {
        match phase {
            Phase::Work => self.work_timer,
            Phase::Break => self.break_timer,
        }
    }

    /// Fill in a missing id from the name.
    pub fn ensure_id(&mut self) -> &str {
        if self.id.trim().is_empty() {
            self.id = preset_id_from_name(&self.name);
        }
        &self.id
    }

    /// One-line description, e.g. `Focus (25:00 work / 05:00 break)`.
    pub fn summary(&self) -> String {
        format!(
            "{} ({} work / {} break)",
            self.name, self.work_timer, self.break_timer
        )
    }
}

/// Non-alphanumeric characters become `_`, then the result is lower-cased.
pub fn preset_id_from_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase()
}
