//! Countdown engine implementation.
//!
//! The engine runs a single phase countdown. It does not use internal
//! threads - the caller is responsible for calling `tick()` once per second
//! (see [`Ticker`](super::Ticker) for an async driver).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Finished
//!           |
//!           +-> Idle (stop)
//! ```
//!
//! `remaining_secs` counts ticks, while `elapsed_secs()` is computed from the
//! wall-clock start so late ticks do not distort what gets reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Phase;
use crate::error::{Result, TransitionError, ValidationError};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStatus {
    Idle,
    Running,
    /// Reached zero; waits for the next `start()`.
    Finished,
}

/// Single-phase countdown.
#[derive(Debug, Clone)]
pub struct CountdownEngine {
    status: CountdownStatus,
    phase: Option<Phase>,
    total_secs: u64,
    remaining_secs: u64,
    started_at: Option<DateTime<Utc>>,
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownEngine {
    pub fn new() -> Self {
        Self {
            status: CountdownStatus::Idle,
            phase: None,
            total_secs: 0,
            remaining_secs: 0,
            started_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> CountdownStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == CountdownStatus::Running
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    /// Whole seconds since the phase started, by wall clock.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        self.started_at
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down `duration_secs` for `phase`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive durations and calls made while a countdown is
    /// already running. Neither case changes any state.
    pub fn start(&mut self, phase: Phase, duration_secs: i64, now: DateTime<Utc>) -> Result<Event> {
        if duration_secs <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                value: duration_secs,
            }
            .into());
        }
        if self.is_running() {
            return Err(TransitionError::AlreadyRunning.into());
        }

        let secs = duration_secs as u64;
        self.status = CountdownStatus::Running;
        self.phase = Some(phase);
        self.total_secs = secs;
        self.remaining_secs = secs;
        self.started_at = Some(now);

        Ok(Event::PhaseStarted {
            phase,
            duration_secs: secs,
            at: now,
        })
    }

    /// Advance by one second.
    ///
    /// Returns a `Tick` while running, followed by a single `PhaseComplete`
    /// on the tick that reaches zero. Returns nothing when not running.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let Some(phase) = self.phase.filter(|_| self.is_running()) else {
            return Vec::new();
        };

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let mut events = vec![Event::Tick {
            phase,
            remaining_secs: self.remaining_secs,
        }];

        if self.remaining_secs == 0 {
            self.status = CountdownStatus::Finished;
            events.push(Event::PhaseComplete { phase, at: now });
        }
        events
    }

    /// Cancel ticking. Safe to call at any time; returns whether a running
    /// countdown was actually stopped.
    pub fn stop(&mut self) -> bool {
        if self.is_running() {
            self.status = CountdownStatus::Idle;
            true
        } else {
            false
        }
    }
}
