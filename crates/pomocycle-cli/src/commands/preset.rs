use clap::Subcommand;
use pomocycle_core::{PersistenceGateway, PhaseDuration, TimerPreset};

#[derive(Subcommand)]
pub enum PresetAction {
    /// Save a timer preset (replaces one with the same name)
    Save {
        /// Preset name; the id is derived from it
        name: String,
        /// Work length, MM:SS or minutes
        #[arg(long = "work", value_name = "MM:SS", default_value = "25:00")]
        work_timer: PhaseDuration,
        /// Break length, MM:SS or minutes
        #[arg(long = "break", value_name = "MM:SS", default_value = "05:00")]
        break_timer: PhaseDuration,
    },
    /// List saved presets as JSON
    List,
    /// Show one preset
    Show {
        /// Preset id
        id: String,
    },
    /// Delete a preset. Schedules keep their own copies.
    Delete {
        /// Preset id
        id: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut store) = super::open()?;

    match action {
        PresetAction::Save {
            name,
            work_timer,
            break_timer,
        } => {
            let preset = TimerPreset::new(&name, work_timer, break_timer)?;
            let id = store.save_preset(&preset)?;
            println!("{id}");
            eprintln!("saved {}", preset.summary());
        }
        PresetAction::List => {
            let presets = store.load_presets()?;
            println!("{}", serde_json::to_string_pretty(&presets)?);
        }
        PresetAction::Show { id } => {
            let preset = store.find_preset(&id)?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
        PresetAction::Delete { id } => {
            if !store.delete_preset(&id)? {
                return Err(format!("timer '{id}' not found").into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
