//! Flat tag list and per-run phase tags.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::Phase;

/// Insertion-ordered set of unique, trimmed tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim a tag, rejecting blanks.
    pub fn normalize(tag: &str) -> Result<String, ValidationError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ValidationError::EmptyTag);
        }
        Ok(tag.to_string())
    }

    /// Returns `false` when the tag was already present.
    pub fn insert(&mut self, tag: &str) -> Result<bool, ValidationError> {
        let tag = Self::normalize(tag)?;
        if self.contains(&tag) {
            return Ok(false);
        }
        self.0.push(tag);
        Ok(true)
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.0.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.0
            .iter()
            .filter(|t| t.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops blanks and duplicates from data loaded off disk.
    pub fn dedup(self) -> Self {
        let mut out = Self::new();
        for tag in self.0 {
            let _ = out.insert(&tag);
        }
        out
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect()).dedup()
    }
}

/// Tags shown next to the running work and break phases. Display only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseTags {
    pub work: Option<String>,
    pub break_tag: Option<String>,
}

impl PhaseTags {
    pub fn select(&mut self, phase: Phase, tag: Option<String>) {
        match phase {
            Phase::Work => self.work = tag,
            Phase::Break => self.break_tag = tag,
        }
    }

    pub fn get(&self, phase: Phase) -> Option<&str> {
        match phase {
            Phase::Work => self.work.as_deref(),
            Phase::Break => self.break_tag.as_deref(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
