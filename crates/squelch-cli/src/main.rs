//! Squelch CLI - render, play and edit bass-line voices from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "squelch")]
#[command(author, version, about = "Squelch bass-line voice CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a pattern bank to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a pattern bank on the default output device
    Play(commands::play::PlayArgs),

    /// Create, inspect and edit parameter state files
    State(commands::state::StateArgs),

    /// Create, inspect and edit pattern banks
    Pattern(commands::pattern::PatternArgs),

    /// Manage engine settings
    Settings(commands::settings::SettingsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::State(args) => commands::state::run(args),
        Commands::Pattern(args) => commands::pattern::run(args),
        Commands::Settings(args) => commands::settings::run(args),
    }
}
