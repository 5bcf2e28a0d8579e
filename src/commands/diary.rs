use clap::{Args, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use dadscape_core::Diary;

use super::{find_diary, CommandError, OutputFormat};
use crate::app::App;

#[derive(Args)]
pub struct DiaryCommand {
    #[command(subcommand)]
    pub command: DiarySubcommand,
}

#[derive(Subcommand)]
pub enum DiarySubcommand {
    /// List diaries
    List {
        /// Only diaries in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,

        /// Only active diaries
        #[arg(long)]
        active: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a diary with its tiers and tasks
    Show {
        /// Diary ID (UUID) or name
        diary: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new diary
    Create {
        name: String,

        category: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Update a diary's details (bumps its version)
    Update {
        /// Diary ID (UUID) or name
        diary: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Whether the diary tracks progress
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a diary
    Delete {
        /// Diary ID (UUID) or name
        diary: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// List categories in use
    Categories,

    /// Write a diary to a JSON file
    Export {
        /// Diary ID (UUID) or name
        diary: String,

        /// Directory to write to (default: <data_dir>/diaries)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// File name without extension (default: diary name)
        #[arg(long)]
        file: Option<String>,
    },

    /// Import a diary from a JSON file, replacing one with the same ID
    Import { file: PathBuf },

    /// List exported diary files
    Exported {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// The diary `diary create` adds, complete before its single save and push.
fn new_diary(name: &str, category: &str, description: Option<&str>, rsn: &str) -> Diary {
    let diary = Diary::new(name.trim(), category.trim(), rsn);
    match description {
        Some(description) => diary.with_description(description),
        None => diary,
    }
}

impl DiaryCommand {
    pub fn run(&self, app: &App) -> Result<(), CommandError> {
        let catalog = &app.catalog;
        match &self.command {
            DiarySubcommand::List {
                category,
                active,
                format,
            } => {
                let mut diaries = match category {
                    Some(category) => catalog.list_by_category(category),
                    None => catalog.list_all(),
                };
                if *active {
                    diaries.retain(|d| d.active);
                }

                if diaries.is_empty() {
                    println!("No diaries found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&diaries)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<30}  {:<12}  {:>5}  VERSION",
                            "ID", "NAME", "CATEGORY", "TASKS"
                        );
                        println!("{}", "-".repeat(100));
                        for diary in &diaries {
                            let name = if diary.name.chars().count() > 30 {
                                format!("{}...", diary.name.chars().take(27).collect::<String>())
                            } else {
                                diary.name.clone()
                            };
                            let inactive = if diary.active { "" } else { " (inactive)" };
                            println!(
                                "{:<36}  {:<30}  {:<12}  {:>5}  {}{}",
                                diary.id,
                                name,
                                diary.category,
                                diary.total_task_count(),
                                diary.version,
                                inactive
                            );
                        }
                        println!("\nTotal: {} diary(ies)", diaries.len());
                    }
                }
                Ok(())
            }

            DiarySubcommand::Show { diary, format } => {
                let diary = find_diary(catalog, diary)?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diary)?),
                    OutputFormat::Text => println!("{}", diary),
                }
                Ok(())
            }

            DiarySubcommand::Create {
                name,
                category,
                description,
            } => {
                let rsn = app.require_editor()?;
                if name.trim().is_empty() || category.trim().is_empty() {
                    return Err(CommandError::InvalidInput(
                        "Diary name and category cannot be empty".to_string(),
                    ));
                }

                let diary = catalog.add_diary(new_diary(name, category, description.as_deref(), rsn));
                println!("Created diary:");
                println!("{}", diary);
                Ok(())
            }

            DiarySubcommand::Update {
                diary,
                name,
                description,
                category,
                active,
            } => {
                if name.is_none() && description.is_none() && category.is_none() && active.is_none()
                {
                    return Err(CommandError::InvalidInput(
                        "Nothing to update. Provide at least one option.".to_string(),
                    ));
                }
                let rsn = app.require_editor()?;
                let mut diary = find_diary(catalog, diary)?;

                if let Some(name) = name {
                    diary.name = name.clone();
                }
                if let Some(description) = description {
                    diary.description = description.clone();
                }
                if let Some(category) = category {
                    diary.category = category.clone();
                }
                if let Some(active) = active {
                    diary.active = *active;
                }
                diary.last_modified_by = rsn.to_string();
                diary.increment_version();

                if !catalog.update(diary.clone()) {
                    return Err(CommandError::DiaryNotFound(diary.id.to_string()));
                }
                println!("Updated diary {} to version {}", diary.name, diary.version);
                Ok(())
            }

            DiarySubcommand::Delete { diary, force } => {
                app.require_editor()?;
                let diary = find_diary(catalog, diary)?;

                if !force {
                    print!("Delete diary '{}'? [y/N] ", diary.name);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                catalog.delete(diary.id);
                println!("Deleted diary: {}", diary.name);
                Ok(())
            }

            DiarySubcommand::Categories => {
                let categories = catalog.list_categories();
                if categories.is_empty() {
                    println!("No categories found");
                }
                for category in categories {
                    println!("{}", category);
                }
                Ok(())
            }

            DiarySubcommand::Export { diary, dir, file } => {
                let diary = find_diary(catalog, diary)?;
                let dir = dir.clone().unwrap_or_else(|| app.config.export_dir());
                let file_name = file.as_deref().unwrap_or(&diary.name);

                let path = catalog.export_to_dir(diary.id, &dir, file_name)?;
                println!("Exported '{}' to {}", diary.name, path.display());
                Ok(())
            }

            DiarySubcommand::Import { file } => {
                app.require_editor()?;
                let diary = catalog.import_file(file)?;
                println!("Imported diary: {} ({})", diary.name, diary.id);
                Ok(())
            }

            DiarySubcommand::Exported { dir } => {
                let dir = dir.clone().unwrap_or_else(|| app.config.export_dir());
                let files = catalog.list_exported(&dir)?;
                if files.is_empty() {
                    println!("No exported diaries in {}", dir.display());
                }
                for file in files {
                    println!("{}", file.display());
                }
                Ok(())
            }
        }
    }
}
