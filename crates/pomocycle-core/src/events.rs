use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::session::WeekBucket;
use crate::timer::Phase;

/// Every state change in the runner produces an Event.
/// Front ends subscribe through an [`EventListener`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseStarted {
        phase: Phase,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    Tick {
        phase: Phase,
        remaining_secs: u64,
    },
    /// Countdown reached zero. Emitted once per phase; drives the alarm.
    PhaseComplete {
        phase: Phase,
        at: DateTime<Utc>,
    },
    InstanceStarted {
        index: usize,
        total: usize,
        preset_name: String,
        at: DateTime<Utc>,
    },
    /// Emitted once per schedule run.
    ScheduleComplete {
        schedule_id: String,
        schedule_name: String,
        at: DateTime<Utc>,
    },
    SessionSaved {
        week_bucket: WeekBucket,
        at: DateTime<Utc>,
    },
    /// Session record could not be written; it is kept for retry.
    SaveFailed {
        message: String,
        at: DateTime<Utc>,
    },
    RunCancelled {
        at: DateTime<Utc>,
    },
}

/// Receives runner events as they happen.
pub trait EventListener {
    fn on_event(&mut self, event: &Event);
}

/// Collects every event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventListener for EventLog {
    fn on_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl EventListener for NoopListener {
    fn on_event(&mut self, _event: &Event) {}
}

impl EventListener for UnboundedSender<Event> {
    fn on_event(&mut self, event: &Event) {
        // Receiver gone means nobody is listening any more.
        let _ = self.send(event.clone());
    }
}

impl<L: EventListener + ?Sized> EventListener for &mut L {
    fn on_event(&mut self, event: &Event) {
        (**self).on_event(event);
    }
}

impl<L: EventListener + ?Sized> EventListener for Box<L> {
    fn on_event(&mut self, event: &Event) {
        (**self).on_event(event);
    }
}
