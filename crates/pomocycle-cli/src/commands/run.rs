//! Interactive runs: countdown on stderr, confirmations on stdin.
//!
//! While a phase counts down, stdin accepts:
//!
//! - `s` end the phase now
//! - `t <tag>` tag the phase (the tag is also saved to the tag list)
//! - `q` cancel the run
//!
//! When stdin is closed every prompt takes its default, so a run can finish
//! unattended.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use pomocycle_core::{
    format_clock, BreakFeedback, Config, Event, EventListener, FlowState, JsonStore,
    PersistenceGateway, Phase, Rating, RunnerState, Schedule, ScheduleRunner, Ticker,
    TimerPreset, WorkFeedback,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub enum RunTarget<'a> {
    Schedule(&'a Schedule),
    Single(&'a TimerPreset),
}

/// Renders runner events on stderr.
pub struct TerminalListener {
    bell: bool,
}

impl TerminalListener {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }

    /// One bell after work, two after a break.
    fn ring(&self, phase: Phase) {
        if !self.bell {
            return;
        }
        let bells = match phase {
            Phase::Work => "\x07",
            Phase::Break => "\x07\x07",
        };
        eprint!("{bells}");
    }
}

impl EventListener for TerminalListener {
    fn on_event(&mut self, event: &Event) {
        match event {
            Event::InstanceStarted {
                index,
                total,
                preset_name,
                ..
            } => eprintln!("\n[{}/{}] {preset_name}", index + 1, total),
            Event::PhaseStarted {
                phase,
                duration_secs,
                ..
            } => eprintln!("{phase} started ({})", format_clock(*duration_secs)),
            Event::Tick {
                phase,
                remaining_secs,
            } => eprint!("\r{phase:>5} {}  ", format_clock(*remaining_secs)),
            Event::PhaseComplete { phase, .. } => {
                eprintln!("\n{phase} complete");
                self.ring(*phase);
            }
            Event::ScheduleComplete { schedule_name, .. } => {
                eprintln!("schedule '{schedule_name}' complete")
            }
            Event::SessionSaved { week_bucket, .. } => eprintln!("session saved ({week_bucket})"),
            Event::SaveFailed { message, .. } => {
                eprintln!("warning: session not saved: {message}")
            }
            Event::RunCancelled { .. } => eprintln!("run cancelled"),
        }
        let _ = std::io::stderr().flush();
    }
}

/// Line reader over stdin that remembers EOF.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
    closed: bool,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            closed: false,
        }
    }

    async fn next_line(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) | Err(_) => {
                self.closed = true;
                None
            }
        }
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        eprint!("{question} ");
        let _ = std::io::stderr().flush();
        let answer = self.next_line().await;
        if answer.is_none() {
            eprintln!();
        }
        answer
    }

    /// Next command typed during a countdown. Never resolves after EOF.
    async fn command(&mut self) -> String {
        match self.next_line().await {
            Some(line) => line,
            None => std::future::pending().await,
        }
    }

    /// Ask for a 1-10 rating until one parses. EOF takes the default.
    async fn rating(&mut self, question: &str, default: Rating) -> Rating {
        loop {
            let Some(answer) = self.ask(&format!("{question} (1-10) [{default}]:")).await else {
                return default;
            };
            if answer.is_empty() {
                return default;
            }
            match answer.parse::<Rating>() {
                Ok(rating) => return rating,
                Err(e) => eprintln!("{e}"),
            }
        }
    }

    async fn flow_state(&mut self) -> Option<FlowState> {
        loop {
            let answer = self
                .ask("flow state (distracted/engaged/flow, blank to skip):")
                .await?;
            if answer.is_empty() {
                return None;
            }
            match answer.parse::<FlowState>() {
                Ok(state) => return Some(state),
                Err(e) => eprintln!("{e}"),
            }
        }
    }

    async fn yes(&mut self, question: &str) -> bool {
        match self.ask(&format!("{question} [Y/n]")).await {
            Some(answer) => !answer.eq_ignore_ascii_case("n"),
            None => false,
        }
    }
}

/// What the user chose at a "done" prompt.
enum Confirm {
    Continue { with_feedback: bool },
    Quit,
}

struct RunOptions {
    tick: Duration,
    work_feedback: bool,
    break_feedback: bool,
    default_rating: Rating,
}

impl RunOptions {
    fn from_config(config: &Config) -> CliResult<Self> {
        Ok(Self {
            tick: Duration::from_millis(config.timer.tick_interval_ms),
            work_feedback: config.feedback.work_enabled,
            break_feedback: config.feedback.break_enabled,
            default_rating: Rating::new(i64::from(config.feedback.default_rating))?,
        })
    }
}

/// Run a schedule or single timer to completion on a current-thread runtime.
pub fn run(config: &Config, store: JsonStore, target: RunTarget<'_>) -> CliResult {
    let options = RunOptions::from_config(config)?;
    let listener = TerminalListener::new(config.notifications.enabled);
    let mut runner = ScheduleRunner::new(store, listener);

    let now = Utc::now();
    match target {
        RunTarget::Schedule(schedule) => runner.begin(schedule, now)?,
        RunTarget::Single(preset) => runner.begin_single(preset, now)?,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(interact(&mut runner, &options));
    // A pending stdin read would otherwise hold the runtime open.
    rt.shutdown_background();
    result?;

    println!("{}", serde_json::to_string_pretty(&runner.run_state())?);
    Ok(())
}

async fn interact(
    runner: &mut ScheduleRunner<JsonStore, TerminalListener>,
    options: &RunOptions,
) -> CliResult {
    let ticker = Ticker::new(options.tick);
    let mut prompt = Prompt::new();

    loop {
        match runner.state() {
            RunnerState::RunningWork | RunnerState::RunningBreak => {
                let input = {
                    tokio::select! {
                        _ = ticker.drive(&mut *runner) => None,
                        line = prompt.command() => Some(line),
                    }
                };
                if let Some(line) = input {
                    if !handle_command(runner, &mut prompt, options, &line).await? {
                        break;
                    }
                }
            }
            RunnerState::WorkFinished => {
                if !confirm_work(runner, &mut prompt, options).await? {
                    break;
                }
            }
            RunnerState::BreakFinished => {
                if !confirm_break(runner, &mut prompt, options).await? {
                    break;
                }
            }
            RunnerState::AwaitingNext => {
                runner.advance(Utc::now())?;
            }
            RunnerState::AwaitingFeedback => {
                schedule_feedback(runner, &mut prompt, options).await?;
            }
            RunnerState::Complete | RunnerState::Idle => break,
        }
    }

    retry_unsaved(runner, &mut prompt).await;
    Ok(())
}

/// Returns `false` when the run was cancelled.
async fn handle_command(
    runner: &mut ScheduleRunner<JsonStore, TerminalListener>,
    prompt: &mut Prompt,
    options: &RunOptions,
    line: &str,
) -> CliResult<bool> {
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        "" => {}
        "q" | "quit" => {
            runner.cancel(Utc::now());
            return Ok(false);
        }
        "s" | "skip" => {
            eprintln!();
            return match runner.state() {
                RunnerState::RunningWork => confirm_work(runner, prompt, options).await,
                RunnerState::RunningBreak => confirm_break(runner, prompt, options).await,
                _ => Ok(true),
            };
        }
        "t" | "tag" => {
            let Some(phase) = runner.state().phase() else {
                return Ok(true);
            };
            let tag = arg.trim();
            if tag.is_empty() {
                runner.select_tag(phase, None);
                eprintln!("\n{phase} tag cleared");
                return Ok(true);
            }
            if let Err(e) = runner.gateway_mut().save_tag(tag) {
                warn!(error = %e, "Could not save tag");
            }
            runner.select_tag(phase, Some(tag));
            eprintln!("\n{phase} tag: {tag}");
        }
        _ => eprintln!("\ncommands: s (end phase), t <tag>, q (quit)"),
    }
    Ok(true)
}

async fn confirm(prompt: &mut Prompt, question: &str, forced_feedback: bool) -> Confirm {
    if forced_feedback {
        return Confirm::Continue {
            with_feedback: true,
        };
    }
    match prompt.ask(question).await.as_deref() {
        Some("q") => Confirm::Quit,
        Some("f") => Confirm::Continue {
            with_feedback: true,
        },
        _ => Confirm::Continue {
            with_feedback: false,
        },
    }
}

async fn confirm_work(
    runner: &mut ScheduleRunner<JsonStore, TerminalListener>,
    prompt: &mut Prompt,
    options: &RunOptions,
) -> CliResult<bool> {
    let question = "work done. [enter] start break, [f] feedback first, [q] quit:";
    let with_feedback = match confirm(prompt, question, options.work_feedback).await {
        Confirm::Quit => {
            runner.cancel(Utc::now());
            return Ok(false);
        }
        Confirm::Continue { with_feedback } => with_feedback,
    };

    let feedback = if with_feedback {
        Some(WorkFeedback {
            time_rating: prompt
                .rating("how well did you use the time?", options.default_rating)
                .await,
            flow_state: prompt.flow_state().await,
        })
    } else {
        None
    };
    runner.finish_work(feedback, Utc::now())?;
    Ok(true)
}

async fn confirm_break(
    runner: &mut ScheduleRunner<JsonStore, TerminalListener>,
    prompt: &mut Prompt,
    options: &RunOptions,
) -> CliResult<bool> {
    let more = runner
        .run_state()
        .is_some_and(|s| s.schedule_id.is_some() && !runner.is_last_instance());
    let question = if more {
        "break done. [enter] next timer, [f] feedback first, [q] quit:"
    } else {
        "break done. [enter] finish, [f] feedback first, [q] quit:"
    };
    let with_feedback = match confirm(prompt, question, options.break_feedback).await {
        Confirm::Quit => {
            runner.cancel(Utc::now());
            return Ok(false);
        }
        Confirm::Continue { with_feedback } => with_feedback,
    };

    let feedback = if with_feedback {
        Some(BreakFeedback {
            refresh_rating: prompt
                .rating("how refreshed do you feel?", options.default_rating)
                .await,
        })
    } else {
        None
    };
    runner.next(feedback, Utc::now())?;
    Ok(true)
}

async fn schedule_feedback(
    runner: &mut ScheduleRunner<JsonStore, TerminalListener>,
    prompt: &mut Prompt,
    options: &RunOptions,
) -> CliResult {
    let answer = prompt
        .ask("leave feedback for this schedule? [f] feedback, [enter] skip:")
        .await;
    if answer.as_deref() != Some("f") {
        runner.skip_schedule_feedback()?;
        return Ok(());
    }

    let text = prompt.ask("feedback:").await.unwrap_or_default();
    let rating = prompt
        .rating("rate this schedule", options.default_rating)
        .await;
    loop {
        match runner.submit_schedule_feedback(&text, rating) {
            Ok(_) => {
                eprintln!("feedback saved");
                return Ok(());
            }
            Err(e) if e.is_retryable() => {
                eprintln!("could not save feedback: {e}");
                if !prompt.yes("retry?").await {
                    runner.skip_schedule_feedback()?;
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn retry_unsaved(
    runner: &mut ScheduleRunner<JsonStore, TerminalListener>,
    prompt: &mut Prompt,
) {
    while !runner.pending_records().is_empty() {
        let count = runner.pending_records().len();
        if !prompt
            .yes(&format!("{count} session(s) were not saved. retry?"))
            .await
        {
            eprintln!("{count} session(s) discarded");
            return;
        }
        if let Err(e) = runner.retry_pending(Utc::now()) {
            eprintln!("still failing: {e}");
        }
    }
}
