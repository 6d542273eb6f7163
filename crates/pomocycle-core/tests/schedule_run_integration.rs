//! End-to-end schedule runs against real and in-memory stores.

use std::time::Duration;

use chrono::Utc;
use pomocycle_core::{
    BreakFeedback, Event, EventLog, FlowState, JsonStore, MemoryStore, PersistenceGateway,
    PhaseDuration, Rating, RunnerState, Schedule, ScheduleRunner, Ticker, TimerPreset,
    WorkFeedback,
};
use tempfile::TempDir;

fn preset(name: &str, work_secs: u32, break_secs: u32) -> TimerPreset {
    TimerPreset::new(
        name,
        PhaseDuration::new(0, work_secs),
        PhaseDuration::new(0, break_secs),
    )
    .unwrap()
}

fn run_phase<G: PersistenceGateway>(runner: &mut ScheduleRunner<G, EventLog>, secs: u32) {
    let now = Utc::now();
    for _ in 0..secs {
        runner.tick(now);
    }
}

#[test]
fn morning_schedule_without_feedback() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    let mut runner = ScheduleRunner::new(store, EventLog::new());
    let morning = Schedule::new("Morning", vec![preset("P1", 2, 1), preset("P2", 3, 1)]).unwrap();

    runner.begin(&morning, Utc::now()).unwrap();
    run_phase(&mut runner, 2);
    runner.finish_work(None, Utc::now()).unwrap();
    run_phase(&mut runner, 1);
    assert_eq!(runner.next(None, Utc::now()).unwrap(), RunnerState::RunningWork);

    run_phase(&mut runner, 3);
    runner.finish_work(None, Utc::now()).unwrap();
    run_phase(&mut runner, 1);
    assert_eq!(
        runner.finish_break(None, Utc::now()).unwrap(),
        RunnerState::AwaitingFeedback
    );
    assert!(runner.awaits_schedule_feedback());
    runner.skip_schedule_feedback().unwrap();

    let log = runner.listener();
    assert_eq!(log.count(|e| matches!(e, Event::ScheduleComplete { .. })), 1);
    assert_eq!(log.count(|e| matches!(e, Event::PhaseComplete { .. })), 4);
    assert_eq!(log.count(|e| matches!(e, Event::SessionSaved { .. })), 2);

    let store = runner.gateway();
    let weeks = store.list_weeks().unwrap();
    assert_eq!(weeks.len(), 1);
    let sessions = store.load_sessions(&weeks[0]).unwrap();
    assert_eq!(sessions.len(), 2);
    for record in &sessions {
        assert!(record.work.feedback.is_none());
        assert!(record.break_phase.feedback.is_none());
    }

    // Skipped feedback is written as an explicit null.
    let path = dir.path().join(format!("sessions/{}.json", weeks[0]));
    let raw = std::fs::read_to_string(path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json[0]["work"]["feedback"].is_null());
    assert!(json[1]["break"].as_object().unwrap().contains_key("feedback"));
}

#[test]
fn feedback_is_recorded_with_session() {
    let mut runner = ScheduleRunner::new(MemoryStore::new(), EventLog::new());
    runner.begin_single(&preset("Solo", 1, 1), Utc::now()).unwrap();
    run_phase(&mut runner, 1);
    runner
        .finish_work(
            Some(WorkFeedback {
                time_rating: Rating::new(7).unwrap(),
                flow_state: Some(FlowState::Flow),
            }),
            Utc::now(),
        )
        .unwrap();
    run_phase(&mut runner, 1);
    let state = runner
        .finish_break(
            Some(BreakFeedback {
                refresh_rating: Rating::new(4).unwrap(),
            }),
            Utc::now(),
        )
        .unwrap();
    assert_eq!(state, RunnerState::Complete);

    let sessions = runner.gateway().sessions();
    let work = sessions[0].work.feedback.unwrap();
    assert_eq!(work.time_rating.value(), 7);
    assert_eq!(work.flow_state, Some(FlowState::Flow));
    assert_eq!(
        sessions[0].break_phase.feedback.unwrap().refresh_rating.value(),
        4
    );
}

#[test]
fn storage_outage_does_not_derail_run() {
    let mut runner = ScheduleRunner::new(MemoryStore::new(), EventLog::new());
    let schedule = Schedule::new("Two", vec![preset("a", 1, 1), preset("b", 1, 1)]).unwrap();
    runner.begin(&schedule, Utc::now()).unwrap();
    runner.gateway_mut().set_fail_writes(true);

    for _ in 0..2 {
        run_phase(&mut runner, 1);
        runner.finish_work(None, Utc::now()).unwrap();
        run_phase(&mut runner, 1);
        runner.next(None, Utc::now()).unwrap();
    }
    assert_eq!(runner.state(), RunnerState::AwaitingFeedback);
    assert_eq!(runner.pending_records().len(), 2);
    assert!(runner.gateway().sessions().is_empty());

    runner.gateway_mut().set_fail_writes(false);
    assert_eq!(runner.retry_pending(Utc::now()).unwrap(), 2);
    assert_eq!(runner.gateway().sessions().len(), 2);
    assert_eq!(runner.state(), RunnerState::AwaitingFeedback);
}

#[test]
fn channel_listener_receives_events() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut runner = ScheduleRunner::new(MemoryStore::new(), tx);
    runner.begin_single(&preset("Solo", 2, 1), Utc::now()).unwrap();
    runner.tick(Utc::now());

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event);
    }
    assert!(matches!(kinds[0], Event::InstanceStarted { .. }));
    assert!(matches!(kinds[1], Event::PhaseStarted { .. }));
    assert!(matches!(kinds[2], Event::Tick { remaining_secs: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn ticker_drives_phase_to_completion() {
    let mut runner = ScheduleRunner::new(MemoryStore::new(), EventLog::new());
    runner.begin_single(&preset("Solo", 3, 2), Utc::now()).unwrap();

    let ticker = Ticker::every_second();
    assert_eq!(ticker.drive(&mut runner).await, RunnerState::WorkFinished);
    assert_eq!(
        runner
            .listener()
            .count(|e| matches!(e, Event::Tick { .. })),
        3
    );

    runner.finish_work(None, Utc::now()).unwrap();
    assert_eq!(ticker.drive(&mut runner).await, RunnerState::BreakFinished);

    // Nothing to drive once the phase has ended.
    assert_eq!(ticker.drive(&mut runner).await, RunnerState::BreakFinished);
}

#[tokio::test(start_paused = true)]
async fn dropping_drive_future_then_cancel() {
    let mut runner = ScheduleRunner::new(MemoryStore::new(), EventLog::new());
    runner.begin_single(&preset("Long", 50, 10), Utc::now()).unwrap();

    let ticker = Ticker::new(Duration::from_millis(100));
    let result = tokio::time::timeout(Duration::from_millis(350), ticker.drive(&mut runner)).await;
    assert!(result.is_err());
    assert_eq!(runner.state(), RunnerState::RunningWork);
    assert_eq!(runner.engine().remaining_secs(), 47);

    assert!(runner.cancel(Utc::now()));
    assert_eq!(runner.state(), RunnerState::Idle);
}
