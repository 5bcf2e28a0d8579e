use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the config file path
    Path,
}

/// Keeps the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        let mut shown = config.clone();
                        shown.api.api_key = shown.api.api_key.as_deref().map(mask);
                        println!("{}", serde_json::to_string_pretty(&shown)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        let rsn = if config.rsn.value.is_empty() {
                            "(not set)"
                        } else {
                            config.rsn.value.as_str()
                        };
                        println!("rsn: {}", rsn);
                        println!("  source: {}", config.rsn.source);
                        println!();

                        println!("min_edit_rank: {}", config.min_edit_rank.value);
                        println!("  source: {}", config.min_edit_rank.source);
                        println!();

                        println!("enable_diaries: {}", config.enable_diaries);
                        println!("members: {}", config.members.len());
                        println!();

                        println!("api:");
                        println!("  enabled: {}", config.api.enabled);
                        println!(
                            "  endpoint: {}",
                            config.api.endpoint.as_deref().unwrap_or("(not set)")
                        );
                        println!(
                            "  api_key: {}",
                            config
                                .api
                                .api_key
                                .as_deref()
                                .map(mask)
                                .unwrap_or_else(|| "(not set)".to_string())
                        );
                        println!("  timeout_secs: {}", config.api.timeout_secs);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Path => {
                match &config.config_file {
                    Some(path) => println!("{}", path.display()),
                    None => println!("{}", Config::default_config_path().display()),
                }
                Ok(())
            }
        }
    }
}
