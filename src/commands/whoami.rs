use clap::Args;
use dadscape_core::{is_top_rank, rank};

use super::CommandError;
use crate::app::App;

#[derive(Args)]
pub struct WhoamiCommand {
    /// Set the player's DadCred score
    #[arg(long)]
    pub set_cred: Option<i64>,
}

impl WhoamiCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        let rsn = app.rsn()?;
        let rank = app.rank();

        println!("Player:   {}", rsn);
        match rank {
            Some(value) => println!("Rank:     {} ({})", rank::title(value), value),
            None => println!("Rank:     not a clan member"),
        }
        println!(
            "Can edit: {}",
            if app.config.enable_diaries && app.can_edit() {
                "yes"
            } else {
                "no"
            }
        );
        if rank.is_some_and(is_top_rank) {
            println!("Owner:    yes");
        }

        let mut cred = app.store.load_or_create_cred(rsn);
        if let Some(score) = self.set_cred {
            cred.set_score(score);
            app.store.save_cred(&cred)?;
        }
        println!("DadCred:  {}", cred.display_string());
        Ok(())
    }
}
