use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod config;

use app::App;
use commands::{
    ConfigCommand, DiaryCommand, EventCommand, MotdCommand, ProgressCommand, SyncCommand,
    TaskCommand, TierCommand, WhoamiCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "dadscape")]
#[command(version)]
#[command(about = "Clan achievement diaries and progress tracking", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage diaries
    Diary(DiaryCommand),

    /// Manage diary tiers
    Tier(TierCommand),

    /// Manage diary tasks
    Task(TaskCommand),

    /// Record game events toward task progress
    Event(EventCommand),

    /// Show diary progress
    Progress(ProgressCommand),

    /// Show or change the message of the day
    Motd(MotdCommand),

    /// Sync with the remote diary service
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Show the configured player, rank and DadCred
    Whoami(WhoamiCommand),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "dadscape=debug,dadscape_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let app = App::new(config)?;
    let result = match command {
        Commands::Diary(cmd) => cmd.run(&app),
        Commands::Tier(cmd) => cmd.run(&app),
        Commands::Task(cmd) => cmd.run(&app),
        Commands::Event(cmd) => cmd.run(&app),
        Commands::Progress(cmd) => cmd.run(&app),
        Commands::Motd(cmd) => cmd.run(&app),
        Commands::Sync(cmd) => cmd.run(&app).await,
        Commands::Whoami(cmd) => cmd.run(&app),
        Commands::Config(_) => Ok(()),
    };

    // Local writes are done; give queued remote pushes a chance to land.
    app.finish().await;
    result?;

    Ok(())
}
