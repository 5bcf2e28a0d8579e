use clap::{Args, Subcommand};

use super::CommandError;
use crate::app::App;

#[derive(Args)]
pub struct MotdCommand {
    #[command(subcommand)]
    pub command: MotdSubcommand,
}

#[derive(Subcommand)]
pub enum MotdSubcommand {
    /// Show the clan message of the day
    Show,

    /// Replace the message of the day
    Set { message: String },

    /// Clear the message of the day
    Clear,
}

impl MotdCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        match &self.command {
            MotdSubcommand::Show => {
                let motd = app.catalog.motd();
                if motd.is_empty() {
                    println!("No message of the day");
                } else {
                    println!("{}", motd);
                }
                Ok(())
            }
            MotdSubcommand::Set { message } => {
                app.require_editor()?;
                app.catalog.set_motd(message.as_str());
                println!("Message of the day updated");
                Ok(())
            }
            MotdSubcommand::Clear => {
                app.require_editor()?;
                app.catalog.set_motd("");
                println!("Message of the day cleared");
                Ok(())
            }
        }
    }
}
