//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for burstline using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Burstline - resumable document bursting
#[derive(Parser, Debug)]
#[command(name = "burstline")]
#[command(version, about, long_about = None)]
#[command(author = "Burstline Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "burstline.toml", env = "BURSTLINE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BURSTLINE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Burst an input document into one artifact per token
    Burst(commands::burst::BurstArgs),

    /// Resume a paused or interrupted job from its progress file
    Resume(commands::resume::ResumeArgs),

    /// Ask a running job to pause at the next token
    Pause(commands::control::ControlArgs),

    /// Ask a running job to stop and discard its progress
    Cancel(commands::control::ControlArgs),

    /// Show jobs with saved progress
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
