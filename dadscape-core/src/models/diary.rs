use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::now;
use super::task::Task;
use super::tier::Tier;

/// A clan achievement diary: named, categorized, versioned tiers of tasks.
///
/// Timestamps are kept at millisecond precision, which is what the stored
/// and remote representations carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub version: String,
    #[serde(rename = "createdDate", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(rename = "lastModified", with = "chrono::serde::ts_milliseconds")]
    pub last_modified_at: DateTime<Utc>,
    pub last_modified_by: String,
    #[serde(default)]
    pub tiers: Vec<Tier>,
    pub active: bool,
}

impl Diary {
    pub const INITIAL_VERSION: &'static str = "1.0";

    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = now();
        let created_by = created_by.into();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            version: Self::INITIAL_VERSION.to_string(),
            created_at: now,
            last_modified_by: created_by.clone(),
            created_by,
            last_modified_at: now,
            tiers: Vec::new(),
            active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Stamps the modification time and author.
    pub fn touch(&mut self, modified_by: impl Into<String>) {
        self.last_modified_at = now();
        self.last_modified_by = modified_by.into();
    }

    /// "1.0" becomes "1.1"; anything that is not `major.minor` gets ".1" appended.
    pub fn increment_version(&mut self) {
        self.version = next_version(&self.version);
    }

    /// Appends a tier at the end; its order becomes its position.
    ///
    /// Tier names are unique within a diary, so a duplicate name is refused.
    pub fn add_tier(&mut self, mut tier: Tier) -> bool {
        if self.tier_by_name(&tier.name).is_some() {
            return false;
        }
        tier.order = self.tiers.len() as u32;
        self.tiers.push(tier);
        let by = self.last_modified_by.clone();
        self.touch(by);
        true
    }

    pub fn remove_tier(&mut self, tier_name: &str) -> bool {
        let len_before = self.tiers.len();
        self.tiers.retain(|t| t.name != tier_name);
        if self.tiers.len() == len_before {
            return false;
        }
        self.renumber_tiers();
        let by = self.last_modified_by.clone();
        self.touch(by);
        true
    }

    /// Resets every tier's order to its current position.
    pub fn renumber_tiers(&mut self) {
        for (i, tier) in self.tiers.iter_mut().enumerate() {
            tier.order = i as u32;
        }
    }

    pub fn tier_by_name(&self, tier_name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == tier_name)
    }

    pub fn tier_by_name_mut(&mut self, tier_name: &str) -> Option<&mut Tier> {
        self.tiers.iter_mut().find(|t| t.name == tier_name)
    }

    /// All tasks across tiers, each paired with its tier.
    pub fn tasks(&self) -> impl Iterator<Item = (&Tier, &Task)> {
        self.tiers
            .iter()
            .flat_map(|tier| tier.tasks.iter().map(move |task| (tier, task)))
    }

    pub fn total_task_count(&self) -> usize {
        self.tiers.iter().map(Tier::task_count).sum()
    }
}

fn next_version(version: &str) -> String {
    let bumped = version.split_once('.').and_then(|(major, minor)| {
        if major.is_empty() || minor.contains('.') {
            return None;
        }
        minor
            .parse::<u32>()
            .ok()
            .and_then(|minor| minor.checked_add(1))
            .map(|minor| format!("{}.{}", major, minor))
    });
    bumped.unwrap_or_else(|| format!("{}.1", version))
}

impl fmt::Display for Diary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Active: {}", if self.active { "yes" } else { "no" })?;
        writeln!(
            f,
            "Created: {} by {}",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.created_by
        )?;
        writeln!(
            f,
            "Modified: {} by {}",
            self.last_modified_at.format("%Y-%m-%d %H:%M"),
            self.last_modified_by
        )?;

        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        for tier in &self.tiers {
            writeln!(f, "\n{} ({} task(s))", tier.name, tier.task_count())?;
            if !tier.reward_text.is_empty() {
                writeln!(f, "  Reward: {}", tier.reward_text)?;
            }
            for task in &tier.tasks {
                writeln!(f, "  - {}", task)?;
                writeln!(f, "    id: {}", task.id)?;
            }
        }

        Ok(())
    }
}
