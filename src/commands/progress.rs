use clap::Args;
use dadscape_core::{LogSink, ProgressTracker, TaskStatus};

use super::{find_diary, CommandError, OutputFormat};
use crate::app::App;

#[derive(Args)]
pub struct ProgressCommand {
    /// Diary ID (UUID) or name; all active diaries when omitted
    #[arg(long)]
    pub diary: Option<String>,

    /// Show progress for this player instead of the configured one
    #[arg(long)]
    pub rsn: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ProgressCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        let rsn = match &self.rsn {
            Some(rsn) if !rsn.trim().is_empty() => rsn.trim(),
            _ => app.rsn()?,
        };

        let diaries = match &self.diary {
            Some(identifier) => vec![find_diary(&app.catalog, identifier)?],
            None => app.catalog.list_active(),
        };
        if diaries.is_empty() {
            println!("No active diaries");
            return Ok(());
        }

        let mut tracker =
            ProgressTracker::new(app.catalog.clone(), app.store.clone(), Box::new(LogSink));

        if let OutputFormat::Json = self.format {
            let progress: Vec<_> = diaries
                .iter()
                .map(|d| tracker.load_progress(rsn, d.id))
                .collect();
            println!("{}", serde_json::to_string_pretty(&progress)?);
            return Ok(());
        }

        for diary in &diaries {
            let percent = tracker.completion_percentage(rsn, diary.id);
            println!("{} [{}] {}%", diary.name, diary.category, percent);
            for tier in &diary.tiers {
                println!("  {}", tier.name);
                for task in &tier.tasks {
                    let status = tracker.task_status(rsn, diary.id, task.id);
                    let mark = match status {
                        TaskStatus::Completed => "x",
                        TaskStatus::InProgress { .. } => "~",
                        TaskStatus::NotStarted => " ",
                    };
                    println!("    [{}] {} - {}", mark, task, status);
                }
            }
            println!();
        }
        Ok(())
    }
}
