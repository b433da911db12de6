//! Stage management commands.

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use crm_core::stage::SystemStage;
use crm_core::store::EntityStore;
use crm_core::Verdict;

use super::Session;
use crate::output;

#[derive(Subcommand, Debug)]
pub enum StageCommands {
    /// Append a user-managed stage
    Add {
        /// Stage title
        title: String,
    },

    /// Append a system-managed stage from the catalog
    AddSystem {
        /// Catalog ID or title, e.g. draft-quote
        stage: String,
    },

    /// Rename a stage
    Rename { id: String, title: String },

    /// Delete a stage
    Delete { id: String },

    /// Reorder stages; unlisted stages keep their relative order after these
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Set or clear a stage's time limit in days
    Limit { id: String, days: Option<u32> },
}

pub fn list(session: &Session) -> Result<()> {
    output::print_stages(session.store.stages());
    Ok(())
}

pub fn execute(cmd: StageCommands, session: &mut Session) -> Result<()> {
    match cmd {
        StageCommands::Add { title } => {
            let id = session
                .store
                .edit_stages(|stages| stages.add_stage(&title).id.clone());
            println!("{} Added stage {} ({})", "✓".green().bold(), title.cyan(), id.dimmed());
        }

        StageCommands::AddSystem { stage } => {
            let system = SystemStage::from_str(&stage).ok_or_else(|| {
                let known: Vec<&str> = SystemStage::ALL.iter().map(|s| s.id()).collect();
                anyhow!("Unknown system stage '{}'. Known: {}", stage, known.join(", "))
            })?;
            session
                .store
                .edit_stages(|stages| stages.add_system_stage(system).map(|_| ()))?;
            println!("{} Added system stage {}", "✓".green().bold(), system.title().cyan());
        }

        StageCommands::Rename { id, title } => {
            let verdict = session.store.edit_stages(|stages| stages.rename(&id, &title))?;
            report(verdict, || format!("Renamed {} to {}", id.dimmed(), title.cyan()));
        }

        StageCommands::Delete { id } => {
            let verdict = session.store.edit_stages(|stages| stages.delete(&id))?;
            report(verdict, || format!("Deleted stage {}", id.cyan()));
        }

        StageCommands::Reorder { ids } => {
            session.store.edit_stages(|stages| stages.reorder(&ids))?;
            output::print_stages(session.store.stages());
        }

        StageCommands::Limit { id, days } => {
            session
                .store
                .edit_stages(|stages| stages.set_time_limit(&id, days))?;
            let limit = days.map_or_else(|| "none".to_string(), |d| format!("{} day(s)", d));
            println!("{} Time limit for {} set to {}", "✓".green().bold(), id.cyan(), limit);
        }
    }
    Ok(())
}

fn report(verdict: Verdict, done: impl FnOnce() -> String) {
    match verdict {
        Verdict::Allow => println!("{} {}", "✓".green().bold(), done()),
        Verdict::Deny(notice) => output::print_denied(&notice),
    }
}
