//! In-process store for tests and dry runs.

use std::collections::BTreeMap;

use chrono::Utc;

use super::PersistenceGateway;
use crate::error::{PersistenceError, Result};
use crate::preset::TimerPreset;
use crate::schedule::Schedule;
use crate::session::{Rating, ScheduleFeedbackRecord, SessionRecord, WeekBucket};
use crate::tag::TagSet;

/// Keeps everything in memory. Writes can be switched to fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    presets: BTreeMap<String, TimerPreset>,
    schedules: BTreeMap<String, Schedule>,
    sessions: BTreeMap<WeekBucket, Vec<SessionRecord>>,
    feedback: Vec<ScheduleFeedbackRecord>,
    tags: TagSet,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write returns `PersistenceError::Unavailable`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// All recorded sessions, oldest week first.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.values().flatten().cloned().collect()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled".into()).into());
        }
        Ok(())
    }
}

impl PersistenceGateway for MemoryStore {
    fn load_presets(&self) -> Result<Vec<TimerPreset>> {
        Ok(self.presets.values().cloned().collect())
    }

    fn save_preset(&mut self, preset: &TimerPreset) -> Result<String> {
        self.check_writable()?;
        preset.validate()?;
        let mut preset = preset.clone();
        let id = preset.ensure_id().to_string();
        self.presets.insert(id.clone(), preset);
        Ok(id)
    }

    fn delete_preset(&mut self, id: &str) -> Result<bool> {
        self.check_writable()?;
        Ok(self.presets.remove(id).is_some())
    }

    fn load_schedules(&self) -> Result<Vec<Schedule>> {
        let mut schedules: Vec<Schedule> = self.schedules.values().cloned().collect();
        schedules.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(schedules)
    }

    fn save_schedule(&mut self, schedule: &Schedule) -> Result<String> {
        self.check_writable()?;
        schedule.validate()?;
        self.schedules.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule.id.clone())
    }

    fn delete_schedule(&mut self, id: &str) -> Result<bool> {
        self.check_writable()?;
        Ok(self.schedules.remove(id).is_some())
    }

    fn record_session(&mut self, record: &SessionRecord) -> Result<WeekBucket> {
        self.check_writable()?;
        let week = record.week_bucket();
        let mut record = record.clone();
        record.saved_at = Some(Utc::now());
        self.sessions.entry(week.clone()).or_default().push(record);
        Ok(week)
    }

    fn load_sessions(&self, week: &WeekBucket) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions.get(week).cloned().unwrap_or_default())
    }

    fn list_weeks(&self) -> Result<Vec<WeekBucket>> {
        Ok(self.sessions.keys().cloned().collect())
    }

    fn submit_schedule_feedback(
        &mut self,
        schedule_id: &str,
        text: &str,
        rating: Rating,
    ) -> Result<bool> {
        self.check_writable()?;
        self.feedback.push(ScheduleFeedbackRecord {
            schedule_id: schedule_id.to_string(),
            feedback: text.to_string(),
            rating,
            submitted_at: Some(Utc::now()),
        });
        Ok(true)
    }

    fn load_schedule_feedback(&self) -> Result<Vec<ScheduleFeedbackRecord>> {
        Ok(self.feedback.clone())
    }

    fn load_tags(&self) -> Result<TagSet> {
        Ok(self.tags.clone())
    }

    fn save_tag(&mut self, tag: &str) -> Result<TagSet> {
        self.check_writable()?;
        self.tags.insert(tag)?;
        Ok(self.tags.clone())
    }

    fn delete_tag(&mut self, tag: &str) -> Result<TagSet> {
        self.check_writable()?;
        self.tags.remove(tag);
        Ok(self.tags.clone())
    }
}
