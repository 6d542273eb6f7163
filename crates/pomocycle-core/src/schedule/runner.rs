//! Schedule runner state machine.
//!
//! The runner owns one run context at a time and drives a
//! [`CountdownEngine`] through each instance of a schedule (or a single ad-hoc
//! preset). Like the engine, it never reads the clock itself: every command
//! takes `now` from the caller.
//!
//! Completed work/break pairs are written through the injected
//! [`PersistenceGateway`]. A failed write never blocks a transition; the
//! record is kept in memory until [`ScheduleRunner::retry_pending`] succeeds.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{RunState, RunnerState, Schedule};
use crate::error::{Result, TransitionError};
use crate::events::{Event, EventListener, NoopListener};
use crate::preset::TimerPreset;
use crate::session::{BreakFeedback, PhaseRecord, Rating, SessionRecord, WorkFeedback};
use crate::storage::PersistenceGateway;
use crate::tag::PhaseTags;
use crate::timer::{CountdownEngine, Phase};

#[derive(Debug, Clone)]
enum RunSource {
    Schedule { id: String, name: String },
    Single { name: String },
}

impl RunSource {
    fn name(&self) -> &str {
        match self {
            RunSource::Schedule { name, .. } | RunSource::Single { name } => name,
        }
    }
}

/// Timestamps for the instance in flight.
#[derive(Debug, Clone)]
struct SessionDraft {
    work_start: DateTime<Utc>,
    work_elapsed_secs: u64,
    work_feedback: Option<WorkFeedback>,
    break_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct RunContext {
    source: RunSource,
    instances: Vec<TimerPreset>,
    /// `None` before the first advance.
    index: Option<usize>,
    current: Option<SessionDraft>,
    schedule_complete_signaled: bool,
    feedback_resolved: bool,
}

impl RunContext {
    fn new(source: RunSource, instances: Vec<TimerPreset>) -> Self {
        Self {
            source,
            instances,
            index: None,
            current: None,
            schedule_complete_signaled: false,
            feedback_resolved: false,
        }
    }

    fn current_preset(&self) -> Option<&TimerPreset> {
        self.index.and_then(|i| self.instances.get(i))
    }

    fn is_last(&self) -> bool {
        self.index.is_some_and(|i| i + 1 >= self.instances.len())
    }
}

/// Runs schedules and single timers.
pub struct ScheduleRunner<G, L = NoopListener> {
    engine: CountdownEngine,
    gateway: G,
    listener: L,
    run: Option<RunContext>,
    state: RunnerState,
    tags: PhaseTags,
    pending: Vec<SessionRecord>,
}

impl<G: PersistenceGateway> ScheduleRunner<G, NoopListener> {
    pub fn without_listener(gateway: G) -> Self {
        Self::new(gateway, NoopListener)
    }
}

impl<G: PersistenceGateway, L: EventListener> ScheduleRunner<G, L> {
    pub fn new(gateway: G, listener: L) -> Self {
        Self {
            engine: CountdownEngine::new(),
            gateway,
            listener,
            run: None,
            state: RunnerState::Idle,
            tags: PhaseTags::default(),
            pending: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn tags(&self) -> &PhaseTags {
        &self.tags
    }

    /// Sessions whose save failed, oldest first.
    pub fn pending_records(&self) -> &[SessionRecord] {
        &self.pending
    }

    pub fn current_preset(&self) -> Option<&TimerPreset> {
        self.run.as_ref().and_then(RunContext::current_preset)
    }

    pub fn is_last_instance(&self) -> bool {
        self.run.as_ref().is_some_and(RunContext::is_last)
    }

    /// True while a finished schedule still waits for its feedback prompt.
    pub fn awaits_schedule_feedback(&self) -> bool {
        let Some(run) = &self.run else {
            return false;
        };
        matches!(run.source, RunSource::Schedule { .. })
            && !run.feedback_resolved
            && matches!(
                self.state,
                RunnerState::AwaitingFeedback | RunnerState::Complete
            )
    }

    pub fn run_state(&self) -> Option<RunState> {
        let run = self.run.as_ref()?;
        let schedule_id = match &run.source {
            RunSource::Schedule { id, .. } => Some(id.clone()),
            RunSource::Single { .. } => None,
        };
        let remaining_secs = if self.state.phase().is_some() {
            self.engine.remaining_secs()
        } else {
            0
        };
        Some(RunState {
            schedule_id,
            schedule_name: run.source.name().to_string(),
            current_index: run.index.unwrap_or(0),
            total: run.instances.len(),
            preset_name: run.current_preset().map(|p| p.name.clone()),
            phase: self.state.phase(),
            remaining_secs,
            state: self.state,
            work_tag: self.tags.work.clone(),
            break_tag: self.tags.break_tag.clone(),
        })
    }

    // ── Run lifecycle ────────────────────────────────────────────────

    /// Start a schedule from its first instance.
    ///
    /// # Errors
    ///
    /// `RunActive` if another run has not reached `Complete`, or a
    /// validation error for an empty or malformed schedule.
    pub fn begin(&mut self, schedule: &Schedule, now: DateTime<Utc>) -> Result<RunnerState> {
        self.ensure_inactive()?;
        schedule.validate()?;
        info!(schedule = %schedule.name, instances = schedule.len(), "Starting schedule");
        let source = RunSource::Schedule {
            id: schedule.id.clone(),
            name: schedule.name.clone(),
        };
        self.start_run(RunContext::new(source, schedule.instances.clone()), now)
    }

    /// Run one preset outside any schedule. Ends in `Complete` after the
    /// break without asking for schedule feedback.
    pub fn begin_single(&mut self, preset: &TimerPreset, now: DateTime<Utc>) -> Result<RunnerState> {
        self.ensure_inactive()?;
        preset.validate()?;
        info!(preset = %preset.name, "Starting single timer");
        let source = RunSource::Single {
            name: preset.name.clone(),
        };
        self.start_run(RunContext::new(source, vec![preset.clone()]), now)
    }

    fn ensure_inactive(&self) -> Result<()> {
        match &self.run {
            Some(run) if self.state.is_active() => Err(TransitionError::RunActive {
                name: run.source.name().to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn start_run(&mut self, ctx: RunContext, now: DateTime<Utc>) -> Result<RunnerState> {
        self.engine.stop();
        self.run = Some(ctx);
        self.state = RunnerState::Idle;
        self.advance(now)
    }

    /// Move to the next instance.
    ///
    /// Called mid-phase this skips the rest of the current instance without
    /// recording it. Past the last instance the run becomes `Complete`;
    /// further calls return `Complete` again.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<RunnerState> {
        if self.state == RunnerState::Complete {
            return Ok(RunnerState::Complete);
        }
        let Some(run) = self.run.as_mut() else {
            return Err(TransitionError::NoActiveRun.into());
        };

        self.engine.stop();
        self.tags.reset();
        run.current = None;
        let index = run.index.map_or(0, |i| i + 1);
        run.index = Some(index);
        let total = run.instances.len();

        let Some(preset) = run.instances.get(index).cloned() else {
            self.complete(now);
            return Ok(self.state);
        };

        let started = self
            .engine
            .start(Phase::Work, secs_i64(preset.work_timer.total_secs()), now)?;
        if let Some(run) = self.run.as_mut() {
            run.current = Some(SessionDraft {
                work_start: now,
                work_elapsed_secs: 0,
                work_feedback: None,
                break_start: None,
            });
        }
        self.state = RunnerState::RunningWork;
        debug!(index, total, preset = %preset.name, "Instance started");

        self.emit(Event::InstanceStarted {
            index,
            total,
            preset_name: preset.name,
            at: now,
        });
        self.emit(started);
        Ok(self.state)
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        self.engine.stop();
        self.state = RunnerState::Complete;
        self.signal_schedule_complete(now);
    }

    /// Emits `ScheduleComplete` the first time a schedule run ends.
    fn signal_schedule_complete(&mut self, now: DateTime<Utc>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if run.schedule_complete_signaled {
            return;
        }
        if let RunSource::Schedule { id, name } = &run.source {
            info!(schedule = %name, "Schedule complete");
            let event = Event::ScheduleComplete {
                schedule_id: id.clone(),
                schedule_name: name.clone(),
                at: now,
            };
            run.schedule_complete_signaled = true;
            self.emit(event);
        }
    }

    /// Deliver one second to the engine.
    pub fn tick(&mut self, now: DateTime<Utc>) -> RunnerState {
        if !self.state.is_counting() {
            return self.state;
        }
        for event in self.engine.tick(now) {
            if let Event::PhaseComplete { phase, .. } = &event {
                debug!(%phase, "Phase complete");
                self.state = match phase {
                    Phase::Work => RunnerState::WorkFinished,
                    Phase::Break => RunnerState::BreakFinished,
                };
            }
            self.emit(event);
        }
        self.state
    }

    /// The "done" action after work. Starts the break countdown.
    ///
    /// Accepted once the work countdown has finished, or while it is still
    /// running to end it early.
    pub fn finish_work(
        &mut self,
        feedback: Option<WorkFeedback>,
        now: DateTime<Utc>,
    ) -> Result<RunnerState> {
        if !matches!(
            self.state,
            RunnerState::RunningWork | RunnerState::WorkFinished
        ) {
            return Err(self.not_allowed("finish work"));
        }
        let break_secs = self
            .current_preset()
            .map(|p| p.break_timer.total_secs())
            .ok_or(TransitionError::NoActiveRun)?;
        let work_elapsed = self.engine.elapsed_secs(now);

        self.engine.stop();
        let started = self.engine.start(Phase::Break, secs_i64(break_secs), now)?;
        if let Some(draft) = self.run.as_mut().and_then(|r| r.current.as_mut()) {
            draft.work_elapsed_secs = work_elapsed;
            draft.work_feedback = feedback;
            draft.break_start = Some(now);
        }
        self.state = RunnerState::RunningBreak;
        self.emit(started);
        Ok(self.state)
    }

    /// The "done" action after a break. Records the session, then decides
    /// what comes next.
    pub fn finish_break(
        &mut self,
        feedback: Option<BreakFeedback>,
        now: DateTime<Utc>,
    ) -> Result<RunnerState> {
        if !matches!(
            self.state,
            RunnerState::RunningBreak | RunnerState::BreakFinished
        ) {
            return Err(self.not_allowed("finish break"));
        }
        let break_elapsed = self.engine.elapsed_secs(now);
        self.engine.stop();

        let run = self.run.as_mut().ok_or(TransitionError::NoActiveRun)?;
        let single = matches!(run.source, RunSource::Single { .. });
        let last = run.is_last();
        if let Some(draft) = run.current.take() {
            let record = SessionRecord::new(
                PhaseRecord::new(draft.work_start, draft.work_elapsed_secs, draft.work_feedback),
                PhaseRecord::new(draft.break_start.unwrap_or(now), break_elapsed, feedback),
            );
            self.persist(record, now);
        }

        if single {
            self.complete(now);
        } else if last {
            self.state = RunnerState::AwaitingFeedback;
            self.signal_schedule_complete(now);
        } else {
            self.state = RunnerState::AwaitingNext;
        }
        Ok(self.state)
    }

    /// The "next" action: finish the break if needed, then start the next
    /// instance.
    pub fn next(
        &mut self,
        feedback: Option<BreakFeedback>,
        now: DateTime<Utc>,
    ) -> Result<RunnerState> {
        let state = if self.state == RunnerState::AwaitingNext {
            self.state
        } else {
            self.finish_break(feedback, now)?
        };
        if state == RunnerState::AwaitingNext {
            self.advance(now)
        } else {
            Ok(state)
        }
    }

    fn persist(&mut self, record: SessionRecord, now: DateTime<Utc>) {
        match self.gateway.record_session(&record) {
            Ok(week_bucket) => {
                info!(week = %week_bucket, "Session saved");
                self.emit(Event::SessionSaved { week_bucket, at: now });
            }
            Err(e) => {
                warn!(error = %e, "Failed to save session; kept for retry");
                self.pending.push(record);
                self.emit(Event::SaveFailed {
                    message: e.to_string(),
                    at: now,
                });
            }
        }
    }

    /// Re-send sessions whose save failed. Stops at the first failure and
    /// keeps it, and everything after it, for the next attempt.
    pub fn retry_pending(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let mut saved = 0;
        let queue = std::mem::take(&mut self.pending);
        let mut rest = queue.into_iter();
        while let Some(record) = rest.next() {
            match self.gateway.record_session(&record) {
                Ok(week_bucket) => {
                    saved += 1;
                    self.emit(Event::SessionSaved {
                        week_bucket,
                        at: now,
                    });
                }
                Err(e) => {
                    self.pending.push(record);
                    self.pending.extend(rest);
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }

    // ── Schedule feedback ────────────────────────────────────────────

    /// Send feedback for the finished schedule and close the run.
    ///
    /// On a storage error nothing changes, so the user can retry.
    pub fn submit_schedule_feedback(&mut self, text: &str, rating: Rating) -> Result<bool> {
        if !self.awaits_schedule_feedback() {
            return Err(self.not_allowed("submit schedule feedback"));
        }
        let Some(RunSource::Schedule { id, .. }) = self.run.as_ref().map(|r| &r.source) else {
            return Err(TransitionError::NoActiveRun.into());
        };
        let id = id.clone();
        let accepted = self
            .gateway
            .submit_schedule_feedback(&id, text.trim(), rating)?;
        self.resolve_feedback();
        Ok(accepted)
    }

    pub fn skip_schedule_feedback(&mut self) -> Result<RunnerState> {
        if !self.awaits_schedule_feedback() {
            return Err(self.not_allowed("skip schedule feedback"));
        }
        self.resolve_feedback();
        Ok(self.state)
    }

    fn resolve_feedback(&mut self) {
        if let Some(run) = self.run.as_mut() {
            run.feedback_resolved = true;
        }
        self.state = RunnerState::Complete;
    }

    /// Abandon the run. Returns `false` if nothing was active.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        let was_active = self.state.is_active();
        self.engine.stop();
        self.run = None;
        self.tags.reset();
        self.state = RunnerState::Idle;
        if was_active {
            info!("Run cancelled");
            self.emit(Event::RunCancelled { at: now });
        }
        was_active
    }

    /// Attach a display tag to a phase. Blank clears it.
    pub fn select_tag(&mut self, phase: Phase, tag: Option<&str>) {
        let tag = tag.map(str::trim).filter(|t| !t.is_empty()).map(String::from);
        self.tags.select(phase, tag);
    }

    fn emit(&mut self, event: Event) {
        self.listener.on_event(&event);
    }

    fn not_allowed(&self, action: &'static str) -> crate::CoreError {
        TransitionError::NotAllowed {
            action,
            state: self.state,
        }
        .into()
    }
}

fn secs_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::storage::MemoryStore;
    use crate::timer::PhaseDuration;
    use crate::CoreError;
    use chrono::Duration;

    fn preset(name: &str, work: u32, brk: u32) -> TimerPreset {
        TimerPreset::new(name, PhaseDuration::new(0, work), PhaseDuration::new(0, brk)).unwrap()
    }

    fn runner() -> ScheduleRunner<MemoryStore, EventLog> {
        ScheduleRunner::new(MemoryStore::new(), EventLog::new())
    }

    fn tick_n(r: &mut ScheduleRunner<MemoryStore, EventLog>, n: u32, now: DateTime<Utc>) {
        for _ in 0..n {
            r.tick(now);
        }
    }

    fn schedule_complete_count(r: &ScheduleRunner<MemoryStore, EventLog>) -> usize {
        r.listener()
            .count(|e| matches!(e, Event::ScheduleComplete { .. }))
    }

    #[test]
    fn begin_starts_first_work_phase() {
        let mut r = runner();
        let schedule = Schedule::new("Morning", vec![preset("a", 3, 2)]).unwrap();
        let now = Utc::now();
        assert_eq!(r.begin(&schedule, now).unwrap(), RunnerState::RunningWork);

        let snap = r.run_state().unwrap();
        assert_eq!(snap.current_index, 0);
        assert_eq!(snap.total, 1);
        assert_eq!(snap.remaining_secs, 3);
        assert_eq!(snap.phase, Some(Phase::Work));
        assert!(matches!(
            r.listener().events()[0],
            Event::InstanceStarted { index: 0, total: 1, .. }
        ));
    }

    #[test]
    fn empty_schedule_cannot_run() {
        let mut r = runner();
        let schedule = Schedule {
            id: "x".into(),
            name: "Empty".into(),
            instances: vec![],
            created_at: Utc::now(),
        };
        assert!(matches!(
            r.begin(&schedule, Utc::now()),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(r.state(), RunnerState::Idle);
    }

    #[test]
    fn second_run_rejected_while_active() {
        let mut r = runner();
        let schedule = Schedule::new("Morning", vec![preset("a", 3, 2)]).unwrap();
        r.begin(&schedule, Utc::now()).unwrap();

        let err = r.begin_single(&preset("b", 1, 1), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Transition(TransitionError::RunActive { .. })
        ));
        assert_eq!(r.run_state().unwrap().schedule_name, "Morning");
    }

    #[test]
    fn work_needs_done_before_break() {
        let mut r = runner();
        let now = Utc::now();
        r.begin_single(&preset("a", 2, 1), now).unwrap();
        tick_n(&mut r, 2, now);
        assert_eq!(r.state(), RunnerState::WorkFinished);

        // More ticks do nothing until the user confirms.
        tick_n(&mut r, 5, now);
        assert_eq!(r.state(), RunnerState::WorkFinished);

        assert_eq!(
            r.finish_work(None, now).unwrap(),
            RunnerState::RunningBreak
        );
        assert_eq!(r.engine().remaining_secs(), 1);
    }

    #[test]
    fn finish_break_rejected_during_work() {
        let mut r = runner();
        r.begin_single(&preset("a", 2, 1), Utc::now()).unwrap();
        let err = r.finish_break(None, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Transition(TransitionError::NotAllowed { .. })
        ));
        assert_eq!(r.state(), RunnerState::RunningWork);
    }

    #[test]
    fn single_run_records_and_completes() {
        let mut r = runner();
        let start = Utc::now();
        r.begin_single(&preset("a", 2, 1), start).unwrap();
        tick_n(&mut r, 2, start);
        let work_done = start + Duration::seconds(3);
        r.finish_work(None, work_done).unwrap();
        r.tick(work_done);
        let state = r
            .finish_break(None, work_done + Duration::seconds(1))
            .unwrap();
        assert_eq!(state, RunnerState::Complete);
        assert!(!r.awaits_schedule_feedback());
        assert_eq!(schedule_complete_count(&r), 0);

        let sessions = r.gateway().sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].work.elapsed_secs, 3);
        assert_eq!(sessions[0].break_phase.elapsed_secs, 1);
        assert!(sessions[0].work.feedback.is_none());
    }

    #[test]
    fn schedule_run_waits_for_next_then_feedback() {
        let mut r = runner();
        let now = Utc::now();
        let schedule =
            Schedule::new("Morning", vec![preset("p1", 1, 1), preset("p2", 1, 1)]).unwrap();
        r.begin(&schedule, now).unwrap();

        r.tick(now);
        r.finish_work(None, now).unwrap();
        r.tick(now);
        assert_eq!(r.state(), RunnerState::BreakFinished);
        assert_eq!(r.finish_break(None, now).unwrap(), RunnerState::AwaitingNext);
        assert_eq!(r.next(None, now).unwrap(), RunnerState::RunningWork);
        assert_eq!(r.run_state().unwrap().current_index, 1);

        r.tick(now);
        r.finish_work(None, now).unwrap();
        r.tick(now);
        assert_eq!(r.next(None, now).unwrap(), RunnerState::AwaitingFeedback);
        assert!(r.awaits_schedule_feedback());
        assert_eq!(schedule_complete_count(&r), 1);

        assert!(r
            .submit_schedule_feedback("good", Rating::new(8).unwrap())
            .unwrap());
        assert_eq!(r.state(), RunnerState::Complete);
        assert!(!r.awaits_schedule_feedback());
        assert_eq!(r.gateway().sessions().len(), 2);
        assert_eq!(r.gateway().load_schedule_feedback().unwrap().len(), 1);

        // Idempotent past completion.
        assert_eq!(r.advance(now).unwrap(), RunnerState::Complete);
        assert_eq!(schedule_complete_count(&r), 1);
    }

    #[test]
    fn advance_mid_run_skips_without_recording() {
        let mut r = runner();
        let now = Utc::now();
        let schedule =
            Schedule::new("Morning", vec![preset("p1", 5, 5), preset("p2", 5, 5)]).unwrap();
        r.begin(&schedule, now).unwrap();
        r.select_tag(Phase::Work, Some("deep"));
        r.tick(now);

        assert_eq!(r.advance(now).unwrap(), RunnerState::RunningWork);
        assert_eq!(r.run_state().unwrap().preset_name.as_deref(), Some("p2"));
        assert_eq!(r.engine().remaining_secs(), 5);
        assert!(r.tags().work.is_none());
        assert!(r.gateway().sessions().is_empty());
    }

    #[test]
    fn failed_save_keeps_state_and_record() {
        let mut r = runner();
        let now = Utc::now();
        let schedule =
            Schedule::new("Morning", vec![preset("p1", 1, 1), preset("p2", 1, 1)]).unwrap();
        r.begin(&schedule, now).unwrap();
        r.gateway_mut().set_fail_writes(true);

        r.tick(now);
        r.finish_work(None, now).unwrap();
        r.tick(now);
        assert_eq!(r.finish_break(None, now).unwrap(), RunnerState::AwaitingNext);
        assert_eq!(r.pending_records().len(), 1);
        assert_eq!(
            r.listener()
                .count(|e| matches!(e, Event::SaveFailed { .. })),
            1
        );

        assert!(r.retry_pending(now).is_err());
        assert_eq!(r.pending_records().len(), 1);

        r.gateway_mut().set_fail_writes(false);
        let retried_at = now + chrono::Duration::minutes(3);
        assert_eq!(r.retry_pending(retried_at).unwrap(), 1);
        assert!(r.pending_records().is_empty());
        assert_eq!(r.gateway().sessions().len(), 1);
        assert!(matches!(
            r.listener().events().last(),
            Some(Event::SessionSaved { at, .. }) if *at == retried_at
        ));
    }

    #[test]
    fn schedule_feedback_failure_is_retryable() {
        let mut r = runner();
        let now = Utc::now();
        let schedule = Schedule::new("Morning", vec![preset("p1", 1, 1)]).unwrap();
        r.begin(&schedule, now).unwrap();
        r.tick(now);
        r.finish_work(None, now).unwrap();
        r.tick(now);
        r.finish_break(None, now).unwrap();

        r.gateway_mut().set_fail_writes(true);
        let rating = Rating::new(5).unwrap();
        assert!(r.submit_schedule_feedback("meh", rating).is_err());
        assert_eq!(r.state(), RunnerState::AwaitingFeedback);

        r.gateway_mut().set_fail_writes(false);
        assert!(r.submit_schedule_feedback("meh", rating).unwrap());
        assert!(r.submit_schedule_feedback("again", rating).is_err());
    }

    #[test]
    fn skip_feedback_completes() {
        let mut r = runner();
        let now = Utc::now();
        let schedule = Schedule::new("Morning", vec![preset("p1", 1, 1)]).unwrap();
        r.begin(&schedule, now).unwrap();
        r.tick(now);
        r.finish_work(None, now).unwrap();
        r.tick(now);
        r.finish_break(None, now).unwrap();
        assert_eq!(r.skip_schedule_feedback().unwrap(), RunnerState::Complete);
        assert!(r.skip_schedule_feedback().is_err());

        // A finished run does not block the next one.
        assert!(r.begin(&schedule, now).is_ok());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut r = runner();
        r.begin_single(&preset("a", 5, 5), Utc::now()).unwrap();
        assert!(r.cancel(Utc::now()));
        assert!(!r.cancel(Utc::now()));
        assert_eq!(r.state(), RunnerState::Idle);
        assert!(r.run_state().is_none());
        assert_eq!(
            r.listener()
                .count(|e| matches!(e, Event::RunCancelled { .. })),
            1
        );
        assert!(matches!(
            r.advance(Utc::now()),
            Err(CoreError::Transition(TransitionError::NoActiveRun))
        ));
    }

    #[test]
    fn finish_work_early_stops_countdown() {
        let mut r = runner();
        let start = Utc::now();
        r.begin_single(&preset("a", 50, 10), start).unwrap();
        r.tick(start);
        let state = r
            .finish_work(None, start + Duration::seconds(20))
            .unwrap();
        assert_eq!(state, RunnerState::RunningBreak);
        assert_eq!(r.engine().remaining_secs(), 10);
        assert_eq!(r.engine().phase(), Some(Phase::Break));
    }
}
