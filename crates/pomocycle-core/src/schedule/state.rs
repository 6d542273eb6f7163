use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Where the runner is in a run.
///
/// ```text
/// Idle -> RunningWork -> WorkFinished -> RunningBreak -> BreakFinished
///              ^                                             |
///              +------------- AwaitingNext <-----------------+
///                                                            |
///                         Complete <- AwaitingFeedback <-----+ (last instance)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    #[default]
    Idle,
    RunningWork,
    /// Work countdown hit zero; waits for "done".
    WorkFinished,
    RunningBreak,
    /// Break countdown hit zero; waits for "done" or "next".
    BreakFinished,
    AwaitingNext,
    /// Last instance done; waits for schedule feedback.
    AwaitingFeedback,
    Complete,
}

impl RunnerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerState::Idle => "idle",
            RunnerState::RunningWork => "running_work",
            RunnerState::WorkFinished => "work_finished",
            RunnerState::RunningBreak => "running_break",
            RunnerState::BreakFinished => "break_finished",
            RunnerState::AwaitingNext => "awaiting_next",
            RunnerState::AwaitingFeedback => "awaiting_feedback",
            RunnerState::Complete => "complete",
        }
    }

    /// A countdown is ticking.
    pub fn is_counting(&self) -> bool {
        matches!(self, RunnerState::RunningWork | RunnerState::RunningBreak)
    }

    /// A run is in progress. `Complete` does not count.
    pub fn is_active(&self) -> bool {
        !matches!(self, RunnerState::Idle | RunnerState::Complete)
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            RunnerState::RunningWork | RunnerState::WorkFinished => Some(Phase::Work),
            RunnerState::RunningBreak | RunnerState::BreakFinished => Some(Phase::Break),
            _ => None,
        }
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the current run for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub schedule_id: Option<String>,
    pub schedule_name: String,
    /// 0-based; equals `total` once every instance has run.
    pub current_index: usize,
    pub total: usize,
    pub preset_name: Option<String>,
    pub phase: Option<Phase>,
    pub remaining_secs: u64,
    pub state: RunnerState,
    pub work_tag: Option<String>,
    pub break_tag: Option<String>,
}
