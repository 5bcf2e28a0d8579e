//! DadScape Core Library
//!
//! Clan diaries, per-player progress tracking and best-effort sync with the
//! DadScape diary service.

pub mod auth;
pub mod catalog;
pub mod export;
pub mod models;
pub mod storage;
pub mod sync;
pub mod tracker;

pub use auth::{can_edit, is_top_rank, rank, AuthorizationGate, MembershipDirectory};
pub use catalog::{DiaryCatalog, PullReport};
pub use export::ExportError;
pub use models::{
    DadCred, Diary, Target, Task, TaskError, TaskKind, TaskStatus, TaskType, Tier, UserProgress,
};
pub use storage::{DiaryStore, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{ApiClient, PushOp, RemoteApi, SyncCoordinator, SyncError};
pub use tracker::{CompletionSink, LogSink, ProgressTracker, TaskCompleted};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
