//! Susurrus CLI - Layered Conversation Soundscape Compiler
//!
//! Command-line interface for the Susurrus scheduling and mixing engine.

use clap::Parser;
use env_logger::Env;
use log::info;

use susurrus::cli::{commands, Cli, Commands};
use susurrus::Result;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Susurrus v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Susurrus v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("Error [{}]: {}", err.error_code(), err);
        if err.is_user_fixable() {
            eprintln!("Fix the configuration or inputs and re-run; failed renders are never retried automatically.");
        }
        std::process::exit(1);
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Render {
            clips,
            config,
            stereo_out,
            channels_out,
            target_minutes,
        } => commands::render(
            &clips,
            &config,
            stereo_out.as_deref(),
            channels_out.as_deref(),
            target_minutes,
        ),
        Commands::Plan { clips, config } => commands::plan(&clips, &config),
        Commands::Pool { clips } => commands::pool(&clips),
    }
}
