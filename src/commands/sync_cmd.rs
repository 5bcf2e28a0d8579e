//! Sync CLI commands for the remote diary service.

use clap::{Args, Subcommand};
use dadscape_core::ApiClient;

use super::CommandError;
use crate::app::App;

/// Sync with the remote diary service
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Pull diaries and the message of the day (the default)
    Pull,
    /// Show sync configuration and service status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, app: &App) -> Result<(), CommandError> {
        match &self.command {
            None | Some(SyncSubcommand::Pull) => self.pull(app).await,
            Some(SyncSubcommand::Status) => self.status(app).await,
        }
    }

    async fn pull(&self, app: &App) -> Result<(), CommandError> {
        if !app.catalog.sync().is_enabled() {
            println!("Sync is not configured. Run `dadscape sync status` for details.");
            return Ok(());
        }

        println!("Pulling from service...");
        let report = app.catalog.pull_from_api().await;

        match report.diaries_replaced {
            Some(count) => println!("  ✓ diaries updated ({} from service)", count),
            None => println!("  - diaries unchanged, keeping local copy"),
        }
        if report.motd_replaced {
            println!("  ✓ message of the day updated");
        } else {
            println!("  - message of the day unchanged");
        }
        Ok(())
    }

    async fn status(&self, app: &App) -> Result<(), CommandError> {
        let api = &app.config.api;
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !api.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  api:");
            println!("    enabled: true");
            println!("    endpoint: \"https://dadscape.example.com\"");
            println!("    api_key: \"your-api-key\"");
            println!();
            println!("Or set environment variables:");
            println!("  DADSCAPE_API_ENDPOINT");
            println!("  DADSCAPE_API_KEY");
            return Ok(());
        }

        let endpoint = api.endpoint.clone().unwrap_or_default();
        let api_key = api.api_key.clone().unwrap_or_default();
        let prefix: String = api_key.chars().take(8).collect();

        println!("Endpoint: {}", endpoint);
        println!("API Key:  {}...", prefix);
        println!("Timeout:  {}s", api.timeout_secs);
        println!();

        print!("Service status: ");
        let client = ApiClient::new(endpoint, api_key, api.timeout())?;
        if client.check().await {
            println!("✓ connected");
        } else {
            println!("✗ unreachable");
        }
        Ok(())
    }
}
