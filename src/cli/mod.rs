//! CLI Module
//!
//! Command-line interface for the Susurrus soundscape compiler.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Susurrus - layered conversation soundscape compiler
#[derive(Parser, Debug)]
#[command(name = "susurrus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Schedule layers and render the requested outputs
    #[command(name = "render")]
    Render {
        /// Directory of rendered speech clips
        #[arg(short = 'c', long)]
        clips: PathBuf,

        /// Spatialization config (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Path for the mixed stereo soundscape
        #[arg(long)]
        stereo_out: Option<PathBuf>,

        /// Path for the unmixed N-channel asset
        #[arg(long)]
        channels_out: Option<PathBuf>,

        /// Override the config's target duration in minutes
        #[arg(long)]
        target_minutes: Option<f64>,
    },

    /// Preview the layer schedules without rendering anything
    #[command(name = "plan")]
    Plan {
        /// Directory of rendered speech clips
        #[arg(short = 'c', long)]
        clips: PathBuf,

        /// Spatialization config (JSON)
        #[arg(long)]
        config: PathBuf,
    },

    /// List the discovered clip pool
    #[command(name = "pool")]
    Pool {
        /// Directory of rendered speech clips
        #[arg(short = 'c', long)]
        clips: PathBuf,
    },
}
