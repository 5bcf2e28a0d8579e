use clap::{Args, Subcommand};
use dadscape_core::Tier;

use super::{find_diary, CommandError};
use crate::app::App;

#[derive(Args)]
pub struct TierCommand {
    #[command(subcommand)]
    pub command: TierSubcommand,
}

#[derive(Subcommand)]
pub enum TierSubcommand {
    /// Add a tier to the end of a diary
    Add {
        /// Diary ID (UUID) or name
        diary: String,

        /// Tier name (e.g. Easy, Medium, Hard, Elite)
        name: String,

        /// Display color, e.g. "#00FF00"
        #[arg(long)]
        color: Option<String>,

        /// Reward text shown on completion
        #[arg(long)]
        reward: Option<String>,
    },

    /// Remove a tier and all of its tasks
    Remove {
        /// Diary ID (UUID) or name
        diary: String,

        name: String,
    },
}

impl TierCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        match &self.command {
            TierSubcommand::Add {
                diary,
                name,
                color,
                reward,
            } => {
                app.require_editor()?;
                let diary = find_diary(&app.catalog, diary)?;
                if name.trim().is_empty() {
                    return Err(CommandError::InvalidInput(
                        "Tier name cannot be empty".to_string(),
                    ));
                }

                let mut tier = Tier::new(name.trim());
                if let Some(color) = color {
                    tier = tier.with_color(color);
                }
                if let Some(reward) = reward {
                    tier = tier.with_reward(reward);
                }

                if !app.catalog.add_tier(diary.id, tier) {
                    return Err(CommandError::InvalidInput(format!(
                        "Diary '{}' already has a tier named '{}'",
                        diary.name, name
                    )));
                }
                println!("Added tier '{}' to {}", name.trim(), diary.name);
                Ok(())
            }

            TierSubcommand::Remove { diary, name } => {
                app.require_editor()?;
                let diary = find_diary(&app.catalog, diary)?;
                if !app.catalog.remove_tier(diary.id, name) {
                    return Err(CommandError::TierNotFound(name.clone()));
                }
                println!("Removed tier '{}' from {}", name, diary.name);
                Ok(())
            }
        }
    }
}
