use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;

/// A difficulty bucket (Easy, Medium, Hard, Elite...) within a diary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    #[serde(rename = "tierName")]
    pub name: String,
    #[serde(rename = "tierColor", default)]
    pub color_hint: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(rename = "rewardDescription", default)]
    pub reward_text: String,
    #[serde(default)]
    pub order: u32,
}

impl Tier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color_hint: String::new(),
            tasks: Vec::new(),
            reward_text: String::new(),
            order: 0,
        }
    }

    pub fn with_color(mut self, color_hint: impl Into<String>) -> Self {
        self.color_hint = color_hint.into();
        self
    }

    pub fn with_reward(mut self, reward_text: impl Into<String>) -> Self {
        self.reward_text = reward_text.into();
        self
    }

    /// Appends a task; its order becomes its index at insertion time.
    pub fn add_task(&mut self, mut task: Task) {
        task.order = self.tasks.len() as u32;
        self.tasks.push(task);
    }

    pub fn remove_task(&mut self, task_id: Uuid) -> bool {
        let len_before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        self.tasks.len() != len_before
    }

    pub fn task_by_id(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
