use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::task_type::TaskType;

const NPC: &str = "npc";
const COUNT: &str = "count";
const SKILL: &str = "skill";
const LEVEL: &str = "level";
const CHAT_PATTERN: &str = "chatPattern";

/// A numeric requirement such as a kill count or skill level.
///
/// Records authored through the typed constructors always hold a `Count`.
/// Records loaded from storage or the remote keep whatever text they carried;
/// a task whose target is `Unparsed` accumulates progress but never completes.
/// `Missing` means the key was absent, and such tasks are not tracked at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Count(i64),
    Unparsed(String),
    Missing,
}

impl Target {
    pub fn parse(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(Target::Count)
            .unwrap_or_else(|_| Target::Unparsed(raw.to_string()))
    }

    fn from_raw(raw: Option<String>) -> Self {
        raw.map_or(Target::Missing, |r| Target::parse(&r))
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            Target::Count(n) => Some(*n),
            Target::Unparsed(_) | Target::Missing => None,
        }
    }

    /// True when the record carried no value at all for this field.
    pub fn is_missing(&self) -> bool {
        matches!(self, Target::Missing)
    }

    /// The stored text, kept verbatim even when empty.
    fn raw(&self) -> Option<String> {
        match self {
            Target::Count(n) => Some(n.to_string()),
            Target::Unparsed(raw) => Some(raw.clone()),
            Target::Missing => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Count(n) => write!(f, "{}", n),
            Target::Unparsed(raw) => write!(f, "{:?}", raw),
            Target::Missing => write!(f, "?"),
        }
    }
}

/// Type-specific requirements of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Kill { npc: String, count: Target },
    Skill { skill: String, level: Target },
    Quest,
    Item,
    Location,
    Boss,
    Minigame,
    Custom { chat_pattern: String, count: Target },
}

impl TaskKind {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskKind::Kill { .. } => TaskType::Kill,
            TaskKind::Skill { .. } => TaskType::Skill,
            TaskKind::Quest => TaskType::Quest,
            TaskKind::Item => TaskType::Item,
            TaskKind::Location => TaskType::Location,
            TaskKind::Boss => TaskType::Boss,
            TaskKind::Minigame => TaskType::Minigame,
            TaskKind::Custom { .. } => TaskType::Custom,
        }
    }

    /// Builds the kind for `task_type`, taking its known keys out of `requirements`.
    fn take_from(task_type: TaskType, requirements: &mut BTreeMap<String, String>) -> Self {
        match task_type {
            TaskType::Kill => TaskKind::Kill {
                npc: requirements.remove(NPC).unwrap_or_default(),
                count: Target::from_raw(requirements.remove(COUNT)),
            },
            TaskType::Skill => TaskKind::Skill {
                skill: requirements.remove(SKILL).unwrap_or_default(),
                level: Target::from_raw(requirements.remove(LEVEL)),
            },
            TaskType::Custom => TaskKind::Custom {
                chat_pattern: requirements.remove(CHAT_PATTERN).unwrap_or_default(),
                count: Target::from_raw(requirements.remove(COUNT)),
            },
            TaskType::Quest => TaskKind::Quest,
            TaskType::Item => TaskKind::Item,
            TaskType::Location => TaskKind::Location,
            TaskType::Boss => TaskKind::Boss,
            TaskType::Minigame => TaskKind::Minigame,
        }
    }

    fn write_into(&self, requirements: &mut BTreeMap<String, String>) {
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                requirements.insert(key.to_string(), value);
            }
        };
        let text = |value: &String| Some(value.clone()).filter(|v| !v.is_empty());
        match self {
            TaskKind::Kill { npc, count } => {
                put(NPC, text(npc));
                put(COUNT, count.raw());
            }
            TaskKind::Skill { skill, level } => {
                put(SKILL, text(skill));
                put(LEVEL, level.raw());
            }
            TaskKind::Custom {
                chat_pattern,
                count,
            } => {
                put(CHAT_PATTERN, text(chat_pattern));
                put(COUNT, count.raw());
            }
            _ => {}
        }
    }

    /// The kill target when this is a kill task for `npc_name` (case-insensitive).
    pub fn kill_target(&self, npc_name: &str) -> Option<&Target> {
        match self {
            TaskKind::Kill { npc, count }
                if !npc.is_empty()
                    && !count.is_missing()
                    && npc.to_lowercase() == npc_name.to_lowercase() =>
            {
                Some(count)
            }
            _ => None,
        }
    }

    /// The count target when this is a custom task whose pattern occurs in `message`.
    pub fn chat_target(&self, message: &str) -> Option<&Target> {
        match self {
            TaskKind::Custom {
                chat_pattern,
                count,
            } if !chat_pattern.is_empty()
                && !count.is_missing()
                && message
                    .to_lowercase()
                    .contains(&chat_pattern.to_lowercase()) =>
            {
                Some(count)
            }
            _ => None,
        }
    }

    /// The counter target for progress display, if this kind is tracked.
    pub fn tracked_target(&self) -> Option<&Target> {
        match self {
            TaskKind::Kill { count, .. } | TaskKind::Custom { count, .. } => Some(count),
            _ => None,
        }
    }
}

/// Reasons a task is rejected at authoring time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task description cannot be empty")]
    EmptyDescription,
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Field '{field}' must be a positive whole number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// A single trackable objective within a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    pub kind: TaskKind,
    /// Requirement keys the kind does not interpret, kept verbatim.
    pub extra: BTreeMap<String, String>,
    pub hint: String,
    pub order: u32,
}

impl Task {
    pub fn new(description: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            kind,
            extra: BTreeMap::new(),
            hint: String::new(),
            order: 0,
        }
    }

    pub fn kill(description: impl Into<String>, npc: impl Into<String>, count: u32) -> Self {
        Self::new(
            description,
            TaskKind::Kill {
                npc: npc.into(),
                count: Target::Count(i64::from(count)),
            },
        )
    }

    pub fn skill(description: impl Into<String>, skill: impl Into<String>, level: u32) -> Self {
        Self::new(
            description,
            TaskKind::Skill {
                skill: skill.into(),
                level: Target::Count(i64::from(level)),
            },
        )
    }

    pub fn custom(
        description: impl Into<String>,
        chat_pattern: impl Into<String>,
        count: u32,
    ) -> Self {
        Self::new(
            description,
            TaskKind::Custom {
                chat_pattern: chat_pattern.into(),
                count: Target::Count(i64::from(count)),
            },
        )
    }

    /// An informational task of `task_type` with no typed requirements.
    pub fn of_type(description: impl Into<String>, task_type: TaskType) -> Self {
        Self::new(
            description,
            TaskKind::take_from(task_type, &mut BTreeMap::new()),
        )
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn with_requirement(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_requirement(key, value);
        self
    }

    pub fn task_type(&self) -> TaskType {
        self.kind.task_type()
    }

    /// Sets a requirement by its wire key; known keys update the typed fields.
    pub fn set_requirement(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut requirements = self.requirements();
        requirements.insert(key.into(), value.into());
        self.kind = TaskKind::take_from(self.task_type(), &mut requirements);
        self.extra = requirements;
    }

    /// All requirements as the flat string map used on the wire.
    pub fn requirements(&self) -> BTreeMap<String, String> {
        let mut requirements = self.extra.clone();
        self.kind.write_into(&mut requirements);
        requirements
    }

    pub fn requirement(&self, key: &str) -> Option<String> {
        self.requirements().remove(key)
    }

    /// Checks that tracked fields are present and numeric.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.description.trim().is_empty() {
            return Err(TaskError::EmptyDescription);
        }
        match &self.kind {
            TaskKind::Kill { npc, count } => {
                require_text(npc, NPC)?;
                require_positive(count, COUNT)
            }
            TaskKind::Skill { skill, level } => {
                require_text(skill, SKILL)?;
                require_positive(level, LEVEL)
            }
            TaskKind::Custom {
                chat_pattern,
                count,
            } => {
                require_text(chat_pattern, CHAT_PATTERN)?;
                require_positive(count, COUNT)
            }
            _ => Ok(()),
        }
    }
}

fn require_text(value: &str, field: &'static str) -> Result<(), TaskError> {
    if value.trim().is_empty() {
        Err(TaskError::MissingField(field))
    } else {
        Ok(())
    }
}

fn require_positive(target: &Target, field: &'static str) -> Result<(), TaskError> {
    match target {
        Target::Count(n) if *n > 0 => Ok(()),
        Target::Missing => Err(TaskError::MissingField(field)),
        Target::Unparsed(raw) if raw.trim().is_empty() => Err(TaskError::MissingField(field)),
        Target::Count(n) => Err(TaskError::InvalidNumber {
            field,
            value: n.to_string(),
        }),
        Target::Unparsed(raw) => Err(TaskError::InvalidNumber {
            field,
            value: raw.clone(),
        }),
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.task_type().display_name(), self.description)?;
        match &self.kind {
            TaskKind::Kill { npc, count } => write!(f, " ({} x {})", count, npc)?,
            TaskKind::Skill { skill, level } => write!(f, " ({} level {})", skill, level)?,
            TaskKind::Custom {
                chat_pattern,
                count,
            } => write!(f, " ({} x \"{}\")", count, chat_pattern)?,
            _ => {}
        }
        Ok(())
    }
}

/// Wire shape of a task: a type tag plus a flat string requirement map.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: Uuid,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    task_type: TaskType,
    #[serde(default)]
    requirements: BTreeMap<String, String>,
    #[serde(default)]
    hint: String,
    #[serde(default)]
    order: u32,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let mut requirements = record.requirements;
        let kind = TaskKind::take_from(record.task_type, &mut requirements);
        Task {
            id: record.id,
            description: record.description,
            kind,
            extra: requirements,
            hint: record.hint,
            order: record.order,
        }
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        TaskRecord {
            id: task.id,
            task_type: task.task_type(),
            requirements: task.requirements(),
            description: task.description,
            hint: task.hint,
            order: task.order,
        }
    }
}
