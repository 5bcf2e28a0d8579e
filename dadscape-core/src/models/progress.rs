use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::now;

/// One player's counters and completion flags for one diary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub rsn: String,
    pub diary_id: Uuid,
    #[serde(default)]
    pub task_progress: BTreeMap<Uuid, u32>,
    #[serde(default)]
    pub task_completion: BTreeMap<Uuid, bool>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(rsn: impl Into<String>, diary_id: Uuid) -> Self {
        Self {
            rsn: rsn.into(),
            diary_id,
            task_progress: BTreeMap::new(),
            task_completion: BTreeMap::new(),
            last_updated: now(),
        }
    }

    pub fn count(&self, task_id: Uuid) -> u32 {
        self.task_progress.get(&task_id).copied().unwrap_or(0)
    }

    /// Adds `amount` to the task's counter and returns the new value.
    pub fn increment(&mut self, task_id: Uuid, amount: u32) -> u32 {
        let counter = self.task_progress.entry(task_id).or_insert(0);
        *counter = counter.saturating_add(amount);
        let value = *counter;
        self.last_updated = now();
        value
    }

    pub fn is_completed(&self, task_id: Uuid) -> bool {
        self.task_completion.get(&task_id).copied().unwrap_or(false)
    }

    /// Marks the task completed. Returns false if it already was.
    pub fn complete(&mut self, task_id: Uuid) -> bool {
        if self.is_completed(task_id) {
            return false;
        }
        self.task_completion.insert(task_id, true);
        self.last_updated = now();
        true
    }

    pub fn completed_count(&self) -> usize {
        self.task_completion.values().filter(|done| **done).count()
    }

    /// Whole-number percentage of `total_tasks` completed, rounded down.
    pub fn completion_percentage(&self, total_tasks: usize) -> u8 {
        percentage(self.completed_count(), total_tasks)
    }

    pub fn status(&self, task_id: Uuid, target: Option<i64>) -> TaskStatus {
        if self.is_completed(task_id) {
            return TaskStatus::Completed;
        }
        match self.count(task_id) {
            0 => TaskStatus::NotStarted,
            count => TaskStatus::InProgress { count, target },
        }
    }
}

pub(crate) fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (completed.min(total) * 100 / total) as u8
}

/// Where a task stands for one player. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    /// `target` is absent when the task's count could not be parsed.
    InProgress { count: u32, target: Option<i64> },
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::NotStarted => write!(f, "not started"),
            TaskStatus::InProgress {
                count,
                target: Some(target),
            } => write!(f, "{} / {}", count, target),
            TaskStatus::InProgress {
                count,
                target: None,
            } => write!(f, "{} / ?", count),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}
