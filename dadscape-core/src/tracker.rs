//! Turns gameplay events into diary task progress.
//!
//! Events arrive one at a time from the host, so the tracker takes `&mut self`
//! and its progress cache needs no locking. Hosts with several event sources
//! must serialize delivery themselves.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::catalog::DiaryCatalog;
use crate::models::{percentage, Diary, TaskKind, TaskStatus, Target, UserProgress};
use crate::storage::DiaryStore;

/// A task that just reached its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompleted {
    pub rsn: String,
    pub diary_id: Uuid,
    pub diary_name: String,
    pub tier_name: String,
    pub task_id: Uuid,
    pub description: String,
}

impl TaskCompleted {
    /// The line shown to the player.
    pub fn message(&self) -> String {
        format!(
            "Diary Task Complete! [{}] {}",
            self.tier_name, self.description
        )
    }
}

impl fmt::Display for TaskCompleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Receives one notification per completed task.
pub trait CompletionSink: Send {
    fn task_completed(&mut self, event: TaskCompleted);
}

impl CompletionSink for UnboundedSender<TaskCompleted> {
    fn task_completed(&mut self, event: TaskCompleted) {
        if self.send(event).is_err() {
            tracing::debug!("Completion receiver dropped");
        }
    }
}

/// Logs completions and otherwise drops them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl CompletionSink for LogSink {
    fn task_completed(&mut self, event: TaskCompleted) {
        tracing::info!(rsn = %event.rsn, diary = %event.diary_name, "{}", event.message());
    }
}

pub struct ProgressTracker {
    catalog: Arc<DiaryCatalog>,
    store: DiaryStore,
    sink: Box<dyn CompletionSink>,
    cache: HashMap<(String, Uuid), UserProgress>,
}

impl ProgressTracker {
    pub fn new(catalog: Arc<DiaryCatalog>, store: DiaryStore, sink: Box<dyn CompletionSink>) -> Self {
        Self {
            catalog,
            store,
            sink,
            cache: HashMap::new(),
        }
    }

    fn cached(&mut self, rsn: &str, diary_id: Uuid) -> &mut UserProgress {
        let store = &self.store;
        self.cache
            .entry((rsn.to_string(), diary_id))
            .or_insert_with(|| {
                store
                    .load_progress(rsn, diary_id)
                    .unwrap_or_else(|| UserProgress::new(rsn, diary_id))
            })
    }

    /// Progress for (`rsn`, `diary_id`), read from storage on first access.
    pub fn load_progress(&mut self, rsn: &str, diary_id: Uuid) -> UserProgress {
        self.cached(rsn, diary_id).clone()
    }

    /// Counts a kill of `npc_name` toward every matching kill task in active diaries.
    pub fn on_kill_event(&mut self, rsn: &str, npc_name: &str) {
        self.advance(rsn, |kind| kind.kill_target(npc_name).map(Target::value));
    }

    /// Counts a chat line toward every custom task whose pattern it contains.
    pub fn on_chat_event(&mut self, rsn: &str, message: &str) {
        self.advance(rsn, |kind| kind.chat_target(message).map(Target::value));
    }

    /// `matches` yields `None` for tasks the event does not count toward, and
    /// `Some(target)` otherwise. A `None` target means the count could not be
    /// parsed: progress accumulates but the task never completes.
    fn advance(&mut self, rsn: &str, matches: impl Fn(&TaskKind) -> Option<Option<i64>>) {
        for diary in self.catalog.list_active() {
            for tier in &diary.tiers {
                for task in &tier.tasks {
                    let Some(target) = matches(&task.kind) else {
                        continue;
                    };

                    let progress = self.cached(rsn, diary.id);
                    let count = progress.increment(task.id, 1);
                    tracing::debug!(
                        rsn,
                        task = %task.description,
                        count,
                        ?target,
                        "Task progress"
                    );

                    let completed = match target {
                        Some(target) if i64::from(count) >= target => progress.complete(task.id),
                        _ => false,
                    };
                    let snapshot = progress.clone();

                    if completed {
                        tracing::info!(rsn, task = %task.description, "Task completed");
                        self.sink.task_completed(TaskCompleted {
                            rsn: rsn.to_string(),
                            diary_id: diary.id,
                            diary_name: diary.name.clone(),
                            tier_name: tier.name.clone(),
                            task_id: task.id,
                            description: task.description.clone(),
                        });
                    }
                    if let Err(e) = self.store.save_progress(&snapshot) {
                        tracing::error!(error = %e, "Failed to save progress");
                    }
                }
            }
        }
    }

    /// Share of the diary's current tasks completed, 0 to 100 rounded down.
    pub fn completion_percentage(&mut self, rsn: &str, diary_id: Uuid) -> u8 {
        let Some(diary) = self.catalog.get_by_id(diary_id) else {
            return 0;
        };
        let progress = self.cached(rsn, diary_id);
        percentage(completed_in(&diary, progress), diary.total_task_count())
    }

    pub fn task_status(&mut self, rsn: &str, diary_id: Uuid, task_id: Uuid) -> TaskStatus {
        let target = self.catalog.get_by_id(diary_id).and_then(|diary| {
            diary
                .tasks()
                .find(|(_, task)| task.id == task_id)
                .and_then(|(_, task)| task.kind.tracked_target().and_then(Target::value))
        });
        self.cached(rsn, diary_id).status(task_id, target)
    }

    /// Drops every cached entry. Stored progress is untouched.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn completed_in(diary: &Diary, progress: &UserProgress) -> usize {
    diary
        .tasks()
        .filter(|(_, task)| progress.is_completed(task.id))
        .count()
}
