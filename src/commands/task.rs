use clap::{Args, Subcommand};
use dadscape_core::{Task, TaskType};
use uuid::Uuid;

use super::{find_diary, CommandError};
use crate::app::App;

#[derive(Args)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub command: TaskSubcommand,
}

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Add a task to a tier
    Add {
        /// Diary ID (UUID) or name
        diary: String,

        /// Tier name
        tier: String,

        /// Task type: kill, skill, quest, item, location, boss, minigame, custom
        task_type: TaskType,

        /// What the player has to do
        description: String,

        /// NPC name (kill tasks)
        #[arg(long)]
        npc: Option<String>,

        /// Number of kills or chat matches needed
        #[arg(long)]
        count: Option<u32>,

        /// Skill name (skill tasks)
        #[arg(long)]
        skill: Option<String>,

        /// Level needed (skill tasks)
        #[arg(long)]
        level: Option<u32>,

        /// Chat text to match (custom tasks)
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        hint: Option<String>,

        /// Extra requirement as key=value (repeatable)
        #[arg(long = "req", value_parser = parse_requirement)]
        requirements: Vec<(String, String)>,
    },

    /// Remove a task
    Remove {
        /// Diary ID (UUID) or name
        diary: String,

        /// Tier name, or "*" to search every tier
        tier: String,

        /// Task ID (UUID)
        task_id: String,
    },

    /// List the task types
    Types,
}

fn parse_requirement(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Invalid requirement '{}'. Expected key=value", s)),
    }
}

/// Builds a task from command-line fields; typed flags win over `--req`.
fn build_task(
    task_type: TaskType,
    description: &str,
    fields: &[(&str, Option<String>)],
    requirements: &[(String, String)],
    hint: Option<&str>,
) -> Result<Task, CommandError> {
    let mut task = Task::of_type(description.trim(), task_type);
    for (key, value) in requirements {
        task.set_requirement(key.as_str(), value.as_str());
    }
    for (key, value) in fields {
        if let Some(value) = value {
            task.set_requirement(*key, value.as_str());
        }
    }
    if let Some(hint) = hint {
        task = task.with_hint(hint);
    }
    task.validate()?;
    Ok(task)
}

impl TaskCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        match &self.command {
            TaskSubcommand::Add {
                diary,
                tier,
                task_type,
                description,
                npc,
                count,
                skill,
                level,
                pattern,
                hint,
                requirements,
            } => {
                app.require_editor()?;
                let diary = find_diary(&app.catalog, diary)?;
                if diary.tier_by_name(tier).is_none() {
                    return Err(CommandError::TierNotFound(tier.clone()));
                }

                let task = build_task(
                    *task_type,
                    description,
                    &[
                        ("npc", npc.clone()),
                        ("count", count.map(|c| c.to_string())),
                        ("skill", skill.clone()),
                        ("level", level.map(|l| l.to_string())),
                        ("chatPattern", pattern.clone()),
                    ],
                    requirements,
                    hint.as_deref(),
                )?;

                let task_id = task.id;
                let summary = task.to_string();
                if !app.catalog.add_task(diary.id, tier, task) {
                    return Err(CommandError::InvalidInput(format!(
                        "Could not add task to {} / {}",
                        diary.name, tier
                    )));
                }
                println!("Added task {}", task_id);
                println!("  {}", summary);
                Ok(())
            }

            TaskSubcommand::Remove {
                diary,
                task_id,
                tier,
            } => {
                app.require_editor()?;
                let diary = find_diary(&app.catalog, diary)?;
                let id = Uuid::parse_str(task_id)
                    .map_err(|_| CommandError::InvalidInput(format!("Invalid task ID: {}", task_id)))?;

                let removed = if tier == "*" {
                    app.catalog.remove_task_by_id(diary.id, id)
                } else {
                    app.catalog.remove_task(diary.id, tier, id)
                };
                if !removed {
                    return Err(CommandError::TaskNotFound(task_id.clone()));
                }
                println!("Removed task {} from {}", task_id, diary.name);
                Ok(())
            }

            TaskSubcommand::Types => {
                println!("{:<10}  {:<16}  COLOR", "TYPE", "NAME");
                println!("{}", "-".repeat(40));
                for task_type in TaskType::ALL {
                    println!(
                        "{:<10}  {:<16}  {}",
                        task_type.as_str().to_lowercase(),
                        task_type.display_name(),
                        task_type.color_hex()
                    );
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dadscape_core::{TaskError, TaskKind};

    #[test]
    fn test_parse_requirement() {
        assert_eq!(
            parse_requirement("region = Morytania").unwrap(),
            ("region".to_string(), "Morytania".to_string())
        );
        assert_eq!(
            parse_requirement("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_requirement("nokey").is_err());
        assert!(parse_requirement("=value").is_err());
    }

    #[test]
    fn test_build_kill_task() {
        let task = build_task(
            TaskType::Kill,
            "Kill 50 goblins",
            &[("npc", Some("Goblin".to_string())), ("count", Some("50".to_string()))],
            &[],
            Some("Lumbridge"),
        )
        .unwrap();

        assert_eq!(task.task_type(), TaskType::Kill);
        assert_eq!(task.requirement("npc").as_deref(), Some("Goblin"));
        assert_eq!(task.requirement("count").as_deref(), Some("50"));
        assert_eq!(task.hint, "Lumbridge");
        assert!(matches!(task.kind, TaskKind::Kill { .. }));
    }

    #[test]
    fn test_build_task_typed_flag_wins() {
        let task = build_task(
            TaskType::Kill,
            "Kill cows",
            &[("npc", Some("Cow".to_string())), ("count", Some("10".to_string()))],
            &[("count".to_string(), "99".to_string()), ("area".to_string(), "Farm".to_string())],
            None,
        )
        .unwrap();

        assert_eq!(task.requirement("count").as_deref(), Some("10"));
        assert_eq!(task.requirement("area").as_deref(), Some("Farm"));
    }

    #[test]
    fn test_build_task_missing_npc() {
        let result = build_task(
            TaskType::Kill,
            "Kill something",
            &[("count", Some("5".to_string()))],
            &[],
            None,
        );
        assert!(matches!(
            result,
            Err(CommandError::InvalidTask(TaskError::MissingField(_)))
        ));
    }

    #[test]
    fn test_build_informational_task() {
        let task = build_task(TaskType::Quest, "Complete Dragon Slayer", &[], &[], None).unwrap();
        assert_eq!(task.task_type(), TaskType::Quest);
        assert!(task.requirements().is_empty());
    }
}
