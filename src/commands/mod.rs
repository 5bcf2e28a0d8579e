mod config_cmd;
mod diary;
mod event;
mod motd;
mod progress;
mod sync_cmd;
mod task;
mod tier;
mod whoami;

pub use config_cmd::ConfigCommand;
pub use diary::DiaryCommand;
pub use event::EventCommand;
pub use motd::MotdCommand;
pub use progress::ProgressCommand;
pub use sync_cmd::SyncCommand;
pub use task::TaskCommand;
pub use tier::TierCommand;
pub use whoami::WhoamiCommand;

use clap::ValueEnum;
use dadscape_core::{Diary, DiaryCatalog, ExportError, StorageError, SyncError, TaskError};
use uuid::Uuid;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Finds a diary by ID (UUID) or, failing that, by case-insensitive name.
pub fn find_diary(catalog: &DiaryCatalog, identifier: &str) -> Result<Diary, CommandError> {
    let found = match Uuid::parse_str(identifier) {
        Ok(id) => catalog.get_by_id(id),
        Err(_) => catalog
            .list_all()
            .into_iter()
            .find(|d| d.name.eq_ignore_ascii_case(identifier)),
    };
    found.ok_or_else(|| CommandError::DiaryNotFound(identifier.to_string()))
}

#[derive(Debug)]
pub enum CommandError {
    /// No player name configured
    NoPlayer,
    /// Diaries switched off in config
    DiariesDisabled,
    NotAuthorized { rsn: String, required: String },
    DiaryNotFound(String),
    TierNotFound(String),
    TaskNotFound(String),
    InvalidTask(TaskError),
    InvalidInput(String),
    Export(ExportError),
    Storage(StorageError),
    Sync(SyncError),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::NoPlayer => write!(
                f,
                "No player name set. Add rsn to config or set DADSCAPE_RSN."
            ),
            CommandError::DiariesDisabled => {
                write!(f, "Diaries are disabled. Set enable_diaries: true in config.")
            }
            CommandError::NotAuthorized { rsn, required } => write!(
                f,
                "{} is not allowed to edit diaries (requires rank {} or higher)",
                rsn, required
            ),
            CommandError::DiaryNotFound(id) => write!(f, "Diary not found: {}", id),
            CommandError::TierNotFound(name) => write!(f, "Tier not found: {}", name),
            CommandError::TaskNotFound(id) => write!(f, "Task not found: {}", id),
            CommandError::InvalidTask(e) => write!(f, "Invalid task: {}", e),
            CommandError::InvalidInput(msg) => write!(f, "{}", msg),
            CommandError::Export(e) => write!(f, "{}", e),
            CommandError::Storage(e) => write!(f, "Storage error: {}", e),
            CommandError::Sync(e) => write!(f, "{}", e),
            CommandError::IoError(e) => write!(f, "I/O error: {}", e),
            CommandError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<TaskError> for CommandError {
    fn from(e: TaskError) -> Self {
        CommandError::InvalidTask(e)
    }
}

impl From<ExportError> for CommandError {
    fn from(e: ExportError) -> Self {
        CommandError::Export(e)
    }
}

impl From<StorageError> for CommandError {
    fn from(e: StorageError) -> Self {
        CommandError::Storage(e)
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError::IoError(e)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::JsonError(e)
    }
}
