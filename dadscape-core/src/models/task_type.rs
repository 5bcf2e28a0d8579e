use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a diary task.
///
/// Only `Kill` and `Custom` tasks are tracked automatically; the other types
/// are informational and completed by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Kill,
    Skill,
    Quest,
    Item,
    Location,
    Boss,
    Minigame,
    Custom,
}

impl TaskType {
    pub const ALL: [TaskType; 8] = [
        TaskType::Kill,
        TaskType::Skill,
        TaskType::Quest,
        TaskType::Item,
        TaskType::Location,
        TaskType::Boss,
        TaskType::Minigame,
        TaskType::Custom,
    ];

    /// Wire name, as stored in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Kill => "KILL",
            TaskType::Skill => "SKILL",
            TaskType::Quest => "QUEST",
            TaskType::Item => "ITEM",
            TaskType::Location => "LOCATION",
            TaskType::Boss => "BOSS",
            TaskType::Minigame => "MINIGAME",
            TaskType::Custom => "CUSTOM",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskType::Kill => "Kill/Combat",
            TaskType::Skill => "Skilling",
            TaskType::Quest => "Quest",
            TaskType::Item => "Item/Equipment",
            TaskType::Location => "Location",
            TaskType::Boss => "Boss/PvM",
            TaskType::Minigame => "Minigame",
            TaskType::Custom => "Custom",
        }
    }

    pub fn color_hex(&self) -> &'static str {
        match self {
            TaskType::Kill => "#FF4444",
            TaskType::Skill => "#44FF44",
            TaskType::Quest => "#4444FF",
            TaskType::Item => "#FFAA44",
            TaskType::Location => "#AA44FF",
            TaskType::Boss => "#FF44AA",
            TaskType::Minigame => "#44FFFF",
            TaskType::Custom => "#AAAAAA",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid task type '{}'. Valid options: kill, skill, quest, item, location, boss, minigame, custom",
                    s
                )
            })
    }
}
