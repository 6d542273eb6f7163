//! # Pomocycle Core Library
//!
//! Core logic for the Pomocycle work/break timer. The `pomocycle` CLI is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: a single-phase countdown that the caller ticks once
//!   per second; it never reads the clock on its own
//! - **Schedule Runner**: plays an ordered list of presets through the engine,
//!   gating each break on user confirmation and recording finished sessions
//! - **Storage**: JSON files per preset/schedule, weekly session buckets, and
//!   TOML configuration
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: countdown state machine
//! - [`ScheduleRunner`]: run-level state machine
//! - [`Ticker`]: async one-second driver
//! - [`PersistenceGateway`]: storage trait, implemented by [`JsonStore`] and
//!   [`MemoryStore`]
//! - [`Config`]: application configuration

pub mod error;
pub mod events;
pub mod preset;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod tag;
pub mod timer;

pub use error::{ConfigError, CoreError, PersistenceError, TransitionError, ValidationError};
pub use events::{Event, EventListener, EventLog, NoopListener};
pub use preset::{preset_id_from_name, TimerPreset};
pub use schedule::{RunState, RunnerState, Schedule, ScheduleDraft, ScheduleRunner};
pub use session::{
    BreakFeedback, FlowState, PhaseRecord, Rating, ScheduleFeedbackRecord, SessionRecord,
    WeekBucket, WorkFeedback,
};
pub use storage::{data_dir, Config, JsonStore, MemoryStore, PersistenceGateway};
pub use tag::{PhaseTags, TagSet};
pub use timer::{format_clock, CountdownEngine, CountdownStatus, Phase, PhaseDuration, Ticker};
