use clap::{Args, Subcommand};
use dadscape_core::{ProgressTracker, TaskCompleted};
use tokio::sync::mpsc;

use super::CommandError;
use crate::app::App;

#[derive(Args)]
pub struct EventCommand {
    /// Record the event for this player instead of the configured one
    #[arg(long, global = true)]
    pub rsn: Option<String>,

    #[command(subcommand)]
    pub command: EventSubcommand,
}

#[derive(Subcommand)]
pub enum EventSubcommand {
    /// Record an NPC kill
    Kill {
        /// NPC name
        npc: String,

        /// Number of kills to record
        #[arg(long, short = 'n', default_value_t = 1)]
        times: u32,
    },

    /// Record a chat message
    Chat { message: String },
}

impl EventCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        if !app.config.enable_diaries {
            return Err(CommandError::DiariesDisabled);
        }
        let rsn = match &self.rsn {
            Some(rsn) if !rsn.trim().is_empty() => rsn.trim(),
            _ => app.rsn()?,
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<TaskCompleted>();
        let mut tracker = ProgressTracker::new(app.catalog.clone(), app.store.clone(), Box::new(tx));

        match &self.command {
            EventSubcommand::Kill { npc, times } => {
                for _ in 0..*times {
                    tracker.on_kill_event(rsn, npc);
                }
                tracing::debug!(rsn, npc = %npc, times, "Recorded kills");
            }
            EventSubcommand::Chat { message } => {
                tracker.on_chat_event(rsn, message);
                tracing::debug!(rsn, "Recorded chat message");
            }
        }

        drop(tracker);
        let mut completed = 0;
        while let Ok(event) = rx.try_recv() {
            println!("{}", event);
            completed += 1;
        }
        if completed == 0 {
            println!("No tasks completed");
        }
        Ok(())
    }
}
