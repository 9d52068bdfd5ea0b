use chrono::NaiveDateTime;
use clap::Subcommand;
use nudge_core::storage::data_dir;
use nudge_core::FactsFile;

#[derive(Subcommand)]
pub enum FactsAction {
    /// Print the facts file
    Show,
    /// Add or update a goal
    SetGoal {
        /// Goal id
        id: String,
        /// Incomplete activities left in the goal
        incomplete: u32,
    },
    /// Remove a goal
    RemoveGoal {
        /// Goal id
        id: String,
    },
    /// Mark whether an activity is on today's schedule
    ScheduledToday {
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

pub fn run(action: FactsAction, now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    let path = FactsFile::path_in(&data_dir()?);
    let mut facts = FactsFile::load_from(&path)?;

    match action {
        FactsAction::Show => {
            print!("{}", toml::to_string_pretty(&facts)?);
            return Ok(());
        }
        FactsAction::SetGoal { id, incomplete } => facts.set_goal(id, incomplete),
        FactsAction::RemoveGoal { id } => {
            if !facts.remove_goal(&id) {
                return Err(format!("unknown goal: {id}").into());
            }
        }
        FactsAction::ScheduledToday { value } => {
            facts.activity_scheduled_on = value.then(|| now.date());
        }
    }
    facts.save_to(&path)?;
    eprintln!("ok");
    Ok(())
}
