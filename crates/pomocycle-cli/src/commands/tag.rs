use clap::Subcommand;
use pomocycle_core::PersistenceGateway;

#[derive(Subcommand)]
pub enum TagAction {
    /// Add a tag (duplicates are ignored)
    Add {
        tag: String,
    },
    /// List tags as JSON
    List {
        /// Case-insensitive substring filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a tag
    Delete {
        tag: String,
    },
}

pub fn run(action: TagAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut store) = super::open()?;

    let tags = match action {
        TagAction::Add { tag } => store.save_tag(&tag)?,
        TagAction::Delete { tag } => store.delete_tag(&tag)?,
        TagAction::List { search: Some(query) } => {
            let tags = store.load_tags()?;
            let matches = tags.search(&query);
            println!("{}", serde_json::to_string_pretty(&matches)?);
            return Ok(());
        }
        TagAction::List { search: None } => store.load_tags()?,
    };
    println!("{}", serde_json::to_string_pretty(&tags)?);
    Ok(())
}
