//! Schedules: ordered lists of preset copies, and the runner that plays them.

mod runner;
mod state;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::preset::TimerPreset;

pub use runner::ScheduleRunner;
pub use state::{RunState, RunnerState};

/// An ordered sequence of timer instances.
///
/// Instances are copies taken when they were added. Editing or deleting the
/// source preset later does not touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub name: String,
    pub instances: Vec<TimerPreset>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(name: &str, instances: Vec<TimerPreset>) -> Result<Self, ValidationError> {
        let schedule = Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            instances,
            created_at: Utc::now(),
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { what: "schedule" });
        }
        if self.instances.is_empty() {
            return Err(ValidationError::EmptySchedule {
                name: self.name.clone(),
            });
        }
        self.instances.iter().try_for_each(TimerPreset::validate)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Sum of all work and break durations.
    pub fn total_secs(&self) -> u64 {
        self.instances
            .iter()
            .map(|p| p.work_timer.total_secs() + p.break_timer.total_secs())
            .sum()
    }
}

/// Create/edit flow for a schedule.
///
/// Nothing is validated until [`finish`](Self::finish), so a draft may be
/// empty or unnamed while it is being built.
#[derive(Debug, Clone, Default)]
pub struct ScheduleDraft {
    id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    name: String,
    instances: Vec<TimerPreset>,
}

impl ScheduleDraft {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Start from a saved schedule; `finish` keeps its id.
    pub fn edit(schedule: &Schedule) -> Self {
        Self {
            id: Some(schedule.id.clone()),
            created_at: Some(schedule.created_at),
            name: schedule.name.clone(),
            instances: schedule.instances.clone(),
        }
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a copy of `preset`.
    pub fn add_instance(&mut self, preset: &TimerPreset) {
        self.instances.push(preset.clone());
    }

    /// Remove the instance at `position` (0-based).
    pub fn remove_instance(&mut self, position: usize) -> Result<TimerPreset, ValidationError> {
        if position >= self.instances.len() {
            return Err(ValidationError::InstanceOutOfBounds {
                index: position,
                len: self.instances.len(),
            });
        }
        Ok(self.instances.remove(position))
    }

    pub fn instances(&self) -> &[TimerPreset] {
        &self.instances
    }

    pub fn finish(self) -> Result<Schedule, ValidationError> {
        let schedule = Schedule {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: self.name.trim().to_string(),
            instances: self.instances,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        };
        schedule.validate()?;
        Ok(schedule)
    }
}
