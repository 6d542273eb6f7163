//! Flat-file JSON store.
//!
//! Layout under the root directory:
//!
//! ```text
//! instances/<preset-id>.json
//! schedules/<schedule-id>.json
//! sessions/<YYYY-weekWW>.json     array of session records
//! tags.json                       array of strings
//! schedule_feedback.json          array of feedback records
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{data_dir, PersistenceGateway};
use crate::error::{PersistenceError, Result};
use crate::preset::TimerPreset;
use crate::schedule::Schedule;
use crate::session::{Rating, ScheduleFeedbackRecord, SessionRecord, WeekBucket};
use crate::tag::TagSet;

const PRESETS_DIR: &str = "instances";
const SCHEDULES_DIR: &str = "schedules";
const SESSIONS_DIR: &str = "sessions";
const TAGS_FILE: &str = "tags.json";
const FEEDBACK_FILE: &str = "schedule_feedback.json";

/// One JSON document per preset and schedule, one array per week.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Use `root` as the store directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| PersistenceError::Write {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Store in the default data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(data_dir()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn preset_path(&self, id: &str) -> PathBuf {
        self.root
            .join(PRESETS_DIR)
            .join(format!("{}.json", file_stem(id)))
    }

    fn schedule_path(&self, id: &str) -> PathBuf {
        self.root
            .join(SCHEDULES_DIR)
            .join(format!("{}.json", file_stem(id)))
    }

    fn week_path(&self, week: &WeekBucket) -> PathBuf {
        self.root
            .join(SESSIONS_DIR)
            .join(format!("{}.json", file_stem(week.as_str())))
    }

    /// Every parsable document in `dir`. Broken files are logged and skipped.
    fn read_dir_docs<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<(String, T)>> {
        let dir = self.root.join(dir);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(PersistenceError::Read { path: dir, source }.into()),
        };

        let mut docs = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| PersistenceError::Read {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            match read_json::<T>(&path) {
                Ok(Some(doc)) => docs.push((stem, doc)),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
            }
        }
        Ok(docs)
    }

    fn read_array<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        Ok(read_json::<Vec<T>>(path)?.unwrap_or_default())
    }
}

/// Restricts ids to `[A-Za-z0-9_-]` so they cannot escape the store.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Write through a temp file and rename so readers never see half a file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|e| PersistenceError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

fn remove_file(path: &Path) -> Result<bool, PersistenceError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl PersistenceGateway for JsonStore {
    fn load_presets(&self) -> Result<Vec<TimerPreset>> {
        let mut presets: Vec<TimerPreset> = self
            .read_dir_docs::<TimerPreset>(PRESETS_DIR)?
            .into_iter()
            .map(|(stem, mut preset)| {
                if preset.id.trim().is_empty() {
                    preset.id = stem;
                }
                preset
            })
            .collect();
        presets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(presets)
    }

    fn save_preset(&mut self, preset: &TimerPreset) -> Result<String> {
        preset.validate()?;
        let mut preset = preset.clone();
        let id = file_stem(preset.ensure_id());
        preset.id = id.clone();
        if preset.created_at.is_none() {
            preset.created_at = Some(Utc::now());
        }
        write_json(&self.preset_path(&id), &preset)?;
        debug!(id = %id, "Saved timer preset");
        Ok(id)
    }

    fn delete_preset(&mut self, id: &str) -> Result<bool> {
        Ok(remove_file(&self.preset_path(id))?)
    }

    fn load_schedules(&self) -> Result<Vec<Schedule>> {
        let mut schedules: Vec<Schedule> = self
            .read_dir_docs::<Schedule>(SCHEDULES_DIR)?
            .into_iter()
            .map(|(_, schedule)| schedule)
            .collect();
        schedules.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(schedules)
    }

    fn save_schedule(&mut self, schedule: &Schedule) -> Result<String> {
        schedule.validate()?;
        write_json(&self.schedule_path(&schedule.id), schedule)?;
        debug!(id = %schedule.id, "Saved schedule");
        Ok(schedule.id.clone())
    }

    fn delete_schedule(&mut self, id: &str) -> Result<bool> {
        Ok(remove_file(&self.schedule_path(id))?)
    }

    fn record_session(&mut self, record: &SessionRecord) -> Result<WeekBucket> {
        let week = record.week_bucket();
        let path = self.week_path(&week);
        let mut records: Vec<SessionRecord> = self.read_array(&path)?;
        let mut record = record.clone();
        record.saved_at = Some(Utc::now());
        records.push(record);
        write_json(&path, &records)?;
        Ok(week)
    }

    fn load_sessions(&self, week: &WeekBucket) -> Result<Vec<SessionRecord>> {
        self.read_array(&self.week_path(week))
    }

    fn list_weeks(&self) -> Result<Vec<WeekBucket>> {
        let mut weeks: Vec<WeekBucket> = self
            .read_dir_docs::<Vec<serde_json::Value>>(SESSIONS_DIR)?
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .filter_map(|(stem, _)| stem.parse().ok())
            .collect();
        weeks.sort();
        Ok(weeks)
    }

    fn submit_schedule_feedback(
        &mut self,
        schedule_id: &str,
        text: &str,
        rating: Rating,
    ) -> Result<bool> {
        let path = self.root.join(FEEDBACK_FILE);
        let mut entries: Vec<ScheduleFeedbackRecord> = self.read_array(&path)?;
        entries.push(ScheduleFeedbackRecord {
            schedule_id: schedule_id.to_string(),
            feedback: text.to_string(),
            rating,
            submitted_at: Some(Utc::now()),
        });
        write_json(&path, &entries)?;
        Ok(true)
    }

    fn load_schedule_feedback(&self) -> Result<Vec<ScheduleFeedbackRecord>> {
        self.read_array(&self.root.join(FEEDBACK_FILE))
    }

    fn load_tags(&self) -> Result<TagSet> {
        Ok(read_json::<TagSet>(&self.root.join(TAGS_FILE))?
            .unwrap_or_default()
            .dedup())
    }

    fn save_tag(&mut self, tag: &str) -> Result<TagSet> {
        let mut tags = self.load_tags()?;
        if tags.insert(tag)? {
            write_json(&self.root.join(TAGS_FILE), &tags)?;
        }
        Ok(tags)
    }

    fn delete_tag(&mut self, tag: &str) -> Result<TagSet> {
        let mut tags = self.load_tags()?;
        if tags.remove(tag) {
            write_json(&self.root.join(TAGS_FILE), &tags)?;
        }
        Ok(tags)
    }
}
