use clap::Subcommand;
use pomocycle_core::{JsonStore, PersistenceGateway, Schedule, ScheduleDraft};

use super::run::{self, RunTarget};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Create a schedule from presets, in the order given
    Create {
        name: String,
        /// Preset id; repeat for each instance
        #[arg(long = "preset", value_name = "ID", required = true)]
        presets: Vec<String>,
    },
    /// List schedules as JSON
    List,
    /// Show one schedule
    Show {
        /// Schedule id or name
        schedule: String,
    },
    /// Append a copy of a preset
    Add {
        /// Schedule id or name
        schedule: String,
        /// Preset id
        preset: String,
    },
    /// Remove the instance at a 1-based position
    Remove {
        /// Schedule id or name
        schedule: String,
        position: usize,
    },
    /// Rename a schedule
    Rename {
        /// Schedule id or name
        schedule: String,
        name: String,
    },
    /// Delete a schedule
    Delete {
        /// Schedule id or name
        schedule: String,
    },
    /// Run a schedule interactively
    Run {
        /// Schedule id or name
        schedule: String,
    },
}

/// Look a schedule up by id, then by exact name.
fn resolve(store: &JsonStore, key: &str) -> Result<Schedule, Box<dyn std::error::Error>> {
    let schedules = store.load_schedules()?;
    schedules
        .iter()
        .find(|s| s.id == key)
        .or_else(|| schedules.iter().find(|s| s.name == key))
        .cloned()
        .ok_or_else(|| format!("schedule '{key}' not found").into())
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, mut store) = super::open()?;

    match action {
        ScheduleAction::Create { name, presets } => {
            let mut draft = ScheduleDraft::new(&name);
            for id in &presets {
                draft.add_instance(&store.find_preset(id)?);
            }
            let schedule = draft.finish()?;
            let id = store.save_schedule(&schedule)?;
            println!("{id}");
            eprintln!("created schedule '{}' with {} timers", schedule.name, schedule.len());
        }
        ScheduleAction::List => {
            let schedules = store.load_schedules()?;
            println!("{}", serde_json::to_string_pretty(&schedules)?);
        }
        ScheduleAction::Show { schedule } => {
            let schedule = resolve(&store, &schedule)?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::Add { schedule, preset } => {
            let mut draft = ScheduleDraft::edit(&resolve(&store, &schedule)?);
            draft.add_instance(&store.find_preset(&preset)?);
            let schedule = draft.finish()?;
            store.save_schedule(&schedule)?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::Remove { schedule, position } => {
            let index = position
                .checked_sub(1)
                .ok_or("positions start at 1")?;
            let mut draft = ScheduleDraft::edit(&resolve(&store, &schedule)?);
            draft.remove_instance(index)?;
            let schedule = draft.finish()?;
            store.save_schedule(&schedule)?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::Rename { schedule, name } => {
            let mut draft = ScheduleDraft::edit(&resolve(&store, &schedule)?);
            draft.rename(&name);
            let schedule = draft.finish()?;
            store.save_schedule(&schedule)?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::Delete { schedule } => {
            let schedule = resolve(&store, &schedule)?;
            store.delete_schedule(&schedule.id)?;
            println!("deleted {}", schedule.id);
        }
        ScheduleAction::Run { schedule } => {
            let schedule = resolve(&store, &schedule)?;
            run::run(&config, store, RunTarget::Schedule(&schedule))?;
        }
    }
    Ok(())
}
