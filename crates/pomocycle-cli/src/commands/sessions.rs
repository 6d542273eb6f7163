use clap::Subcommand;
use pomocycle_core::{PersistenceGateway, WeekBucket};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List weeks that have recorded sessions
    Weeks,
    /// Show the sessions recorded in a week
    Show {
        /// Week key like 2024-week07 (defaults to the current week)
        week: Option<WeekBucket>,
    },
    /// Show feedback left for finished schedules
    Feedback,
}

pub fn run(action: SessionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = super::open()?;

    match action {
        SessionsAction::Weeks => {
            let weeks = store.list_weeks()?;
            println!("{}", serde_json::to_string_pretty(&weeks)?);
        }
        SessionsAction::Show { week } => {
            let week = week.unwrap_or_else(WeekBucket::current);
            let sessions = store.load_sessions(&week)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        SessionsAction::Feedback => {
            let feedback = store.load_schedule_feedback()?;
            println!("{}", serde_json::to_string_pretty(&feedback)?);
        }
    }
    Ok(())
}
