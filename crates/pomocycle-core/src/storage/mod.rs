mod config;
mod json_store;
mod memory;

pub use config::{Config, FeedbackConfig, NotificationsConfig, StorageConfig, TimerConfig};
pub use json_store::JsonStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::{PersistenceError, Result};
use crate::preset::TimerPreset;
use crate::schedule::Schedule;
use crate::session::{Rating, ScheduleFeedbackRecord, SessionRecord, WeekBucket};
use crate::tag::TagSet;

/// Returns the data directory, creating it if needed.
///
/// `POMOCYCLE_DATA_DIR` wins when set. Otherwise `~/.config/pomocycle[-dev]/`,
/// with the `-dev` suffix when `POMOCYCLE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, PersistenceError> {
    let dir = match std::env::var_os("POMOCYCLE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomocycle-dev")
            } else {
                base_dir.join("pomocycle")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| PersistenceError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Storage consumed by the schedule runner and the CLI.
///
/// Every call may fail; callers treat failures as recoverable.
pub trait PersistenceGateway {
    fn load_presets(&self) -> Result<Vec<TimerPreset>>;
    /// Insert or replace by id. Returns the id used.
    fn save_preset(&mut self, preset: &TimerPreset) -> Result<String>;
    fn delete_preset(&mut self, id: &str) -> Result<bool>;

    fn load_schedules(&self) -> Result<Vec<Schedule>>;
    fn save_schedule(&mut self, schedule: &Schedule) -> Result<String>;
    fn delete_schedule(&mut self, id: &str) -> Result<bool>;

    /// Append to the week bucket of the record's work start.
    fn record_session(&mut self, record: &SessionRecord) -> Result<WeekBucket>;
    fn load_sessions(&self, week: &WeekBucket) -> Result<Vec<SessionRecord>>;
    /// Buckets holding at least one record, oldest first.
    fn list_weeks(&self) -> Result<Vec<WeekBucket>>;

    fn submit_schedule_feedback(
        &mut self,
        schedule_id: &str,
        text: &str,
        rating: Rating,
    ) -> Result<bool>;
    fn load_schedule_feedback(&self) -> Result<Vec<ScheduleFeedbackRecord>>;

    fn load_tags(&self) -> Result<TagSet>;
    /// Returns the updated list. Duplicates are ignored.
    fn save_tag(&mut self, tag: &str) -> Result<TagSet>;
    fn delete_tag(&mut self, tag: &str) -> Result<TagSet>;

    fn find_preset(&self, id: &str) -> Result<TimerPreset> {
        self.load_presets()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| {
                PersistenceError::NotFound {
                    kind: "timer",
                    id: id.to_string(),
                }
                .into()
            })
    }

    fn find_schedule(&self, id: &str) -> Result<Schedule> {
        self.load_schedules()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| {
                PersistenceError::NotFound {
                    kind: "schedule",
                    id: id.to_string(),
                }
                .into()
            })
    }
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for &mut G {
    fn load_presets(&self) -> Result<Vec<TimerPreset>> {
        (**self).load_presets()
    }
    fn save_preset(&mut self, preset: &TimerPreset) -> Result<String> {
        (**self).save_preset(preset)
    }
    fn delete_preset(&mut self, id: &str) -> Result<bool> {
        (**self).delete_preset(id)
    }
    fn load_schedules(&self) -> Result<Vec<Schedule>> {
        (**self).load_schedules()
    }
    fn save_schedule(&mut self, schedule: &Schedule) -> Result<String> {
        (**self).save_schedule(schedule)
    }
    fn delete_schedule(&mut self, id: &str) -> Result<bool> {
        (**self).delete_schedule(id)
    }
    fn record_session(&mut self, record: &SessionRecord) -> Result<WeekBucket> {
        (**self).record_session(record)
    }
    fn load_sessions(&self, week: &WeekBucket) -> Result<Vec<SessionRecord>> {
        (**self).load_sessions(week)
    }
    fn list_weeks(&self) -> Result<Vec<WeekBucket>> {
        (**self).list_weeks()
    }
    fn submit_schedule_feedback(
        &mut self,
        schedule_id: &str,
        text: &str,
        rating: Rating,
    ) -> Result<bool> {
        (**self).submit_schedule_feedback(schedule_id, text, rating)
    }
    fn load_schedule_feedback(&self) -> Result<Vec<ScheduleFeedbackRecord>> {
        (**self).load_schedule_feedback()
    }
    fn load_tags(&self) -> Result<TagSet> {
        (**self).load_tags()
    }
    fn save_tag(&mut self, tag: &str) -> Result<TagSet> {
        (**self).save_tag(tag)
    }
    fn delete_tag(&mut self, tag: &str) -> Result<TagSet> {
        (**self).delete_tag(tag)
    }
}
