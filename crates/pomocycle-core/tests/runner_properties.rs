//! Property tests for the countdown engine and schedule runner.

use chrono::Utc;
use pomocycle_core::{
    CountdownEngine, Event, MemoryStore, Phase, PhaseDuration, RunnerState, Schedule,
    ScheduleRunner, TimerPreset,
};
use proptest::prelude::*;

fn schedule_of(len: usize) -> Schedule {
    let instances = (0..len)
        .map(|i| {
            TimerPreset::new(
                &format!("p{i}"),
                PhaseDuration::new(0, 5),
                PhaseDuration::new(0, 5),
            )
            .unwrap()
        })
        .collect();
    Schedule::new("Generated", instances).unwrap()
}

proptest! {
    #[test]
    fn begin_then_n_advances_reaches_complete(len in 1usize..12) {
        let mut runner = ScheduleRunner::without_listener(MemoryStore::new());
        let schedule = schedule_of(len);
        let now = Utc::now();

        runner.begin(&schedule, now).unwrap();
        let mut last_index = 0;
        for step in 1..len {
            prop_assert_eq!(runner.advance(now).unwrap(), RunnerState::RunningWork);
            let index = runner.run_state().unwrap().current_index;
            prop_assert_eq!(index, last_index + 1);
            prop_assert_eq!(index, step);
            last_index = index;
        }
        prop_assert_eq!(runner.advance(now).unwrap(), RunnerState::Complete);
        prop_assert_eq!(runner.advance(now).unwrap(), RunnerState::Complete);
    }

    #[test]
    fn d_ticks_yield_one_completion(d in 1i64..600) {
        let mut engine = CountdownEngine::new();
        let now = Utc::now();
        engine.start(Phase::Work, d, now).unwrap();

        let mut completions = 0;
        for _ in 0..d {
            completions += engine
                .tick(now)
                .iter()
                .filter(|e| matches!(e, Event::PhaseComplete { .. }))
                .count();
        }
        prop_assert_eq!(completions, 1);
        prop_assert_eq!(engine.remaining_secs(), 0);
        prop_assert!(engine.tick(now).is_empty());
    }

    #[test]
    fn non_positive_start_never_runs(d in i64::MIN..=0) {
        let mut engine = CountdownEngine::new();
        prop_assert!(engine.start(Phase::Break, d, Utc::now()).is_err());
        prop_assert!(!engine.is_running());
        prop_assert!(engine.tick(Utc::now()).is_empty());
    }

    #[test]
    fn duration_display_parses_back(minutes in 0u32..1000, seconds in 0u32..60) {
        let duration = PhaseDuration::new(minutes, seconds);
        let parsed: PhaseDuration = duration.to_string().parse().unwrap();
        prop_assert_eq!(parsed, duration);
    }
}
