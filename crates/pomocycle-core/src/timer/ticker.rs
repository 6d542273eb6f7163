//! Async one-second driver for a [`ScheduleRunner`].

use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};

use crate::events::EventListener;
use crate::schedule::{RunnerState, ScheduleRunner};
use crate::storage::PersistenceGateway;

/// Calls `ScheduleRunner::tick` on a fixed period while a phase counts down.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    period: Duration,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::every_second()
    }
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        // tokio panics on a zero period
        let period = period.max(Duration::from_millis(1));
        Self { period }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick the runner until the current phase stops counting.
    ///
    /// Returns the state the runner settled in, usually `WorkFinished` or
    /// `BreakFinished`. Dropping the future stops ticking; the runner keeps
    /// whatever state it had reached.
    pub async fn drive<G, L>(&self, runner: &mut ScheduleRunner<G, L>) -> RunnerState
    where
        G: PersistenceGateway,
        L: EventListener,
    {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        interval.tick().await;

        while runner.state().is_counting() {
            interval.tick().await;
            runner.tick(Utc::now());
        }
        runner.state()
    }
}
