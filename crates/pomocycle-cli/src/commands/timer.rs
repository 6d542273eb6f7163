use clap::Subcommand;
use pomocycle_core::{PersistenceGateway, Phase, PhaseDuration, TimerPreset};

use super::run::{self, RunTarget};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run one work/break pair interactively
    Run {
        /// Saved preset id
        #[arg(long, conflicts_with_all = ["work_timer", "break_timer"])]
        preset: Option<String>,
        /// Work length (defaults to timer.default_work)
        #[arg(long = "work", value_name = "MM:SS")]
        work_timer: Option<PhaseDuration>,
        /// Break length (defaults to timer.default_break)
        #[arg(long = "break", value_name = "MM:SS")]
        break_timer: Option<PhaseDuration>,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, store) = super::open()?;

    match action {
        TimerAction::Run {
            preset,
            work_timer,
            break_timer,
        } => {
            let preset = match preset {
                Some(id) => store.find_preset(&id)?,
                None => {
                    let work = match work_timer {
                        Some(d) => d,
                        None => config.default_duration(Phase::Work)?,
                    };
                    let brk = match break_timer {
                        Some(d) => d,
                        None => config.default_duration(Phase::Break)?,
                    };
                    TimerPreset::new("Timer", work, brk)?
                }
            };
            run::run(&config, store, RunTarget::Single(&preset))?;
        }
    }
    Ok(())
}
