//! Engine settings commands.

use super::common::load_settings;
use anyhow::Context;
use clap::{Args, Subcommand};
use squelch_config::{
    EngineSettings, settings_path, user_config_dir, user_patterns_dir, user_states_dir,
};
use std::path::PathBuf;

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Write default settings (to the user settings file unless OUTPUT is given)
    Init {
        /// Output TOML file
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the settings in effect as TOML
    Show {
        /// Settings file (defaults to the user settings, if present)
        file: Option<PathBuf>,
    },

    /// Show configuration directories
    Paths,
}

pub fn run(args: SettingsArgs) -> anyhow::Result<()> {
    match args.command {
        SettingsCommand::Init { output, force } => {
            let output = output.unwrap_or_else(settings_path);
            if output.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    output.display()
                );
            }
            EngineSettings::default()
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote default settings to {}", output.display());
            Ok(())
        }
        SettingsCommand::Show { file } => {
            let settings = load_settings(file.as_ref())?;
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        SettingsCommand::Paths => {
            println!("Config:   {}", user_config_dir().display());
            println!("Settings: {}", settings_path().display());
            println!("Patterns: {}", user_patterns_dir().display());
            println!("States:   {}", user_states_dir().display());
            Ok(())
        }
    }
}
