//! Command-line interface for safari-gallery.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::app::{App, AppError};

pub use args::{GlobalArgs, OutputSink};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// App error.
    #[error("{0}")]
    App(#[from] AppError),

    /// Gallery error.
    #[error("{0}")]
    Gallery(#[from] crate::gallery::GalleryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// sgal - A safari gallery management utility.
#[derive(Parser, Debug)]
#[command(name = "sgal", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Gallery views.
    Gallery {
        #[command(subcommand)]
        command: commands::gallery::GalleryCommand,
    },

    /// Location management.
    Location {
        #[command(subcommand)]
        command: commands::location::LocationCommand,
    },

    /// Image operations.
    Image {
        #[command(subcommand)]
        command: commands::image::ImageCommand,
    },

    /// Upload a directory of images.
    #[command(name = "bulk-upload")]
    BulkUpload(commands::bulk_upload::BulkUploadArgs),
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        // Create the App from global arguments
        let app = App::new(self.global.to_app_context())?;

        match self.command {
            Command::Gallery { command } => {
                command.run(&app, &self.global).await?;
            }
            Command::Location { command } => {
                command.run(&app, &self.global).await?;
            }
            Command::Image { command } => {
                command.run(&app, &self.global).await?;
            }
            Command::BulkUpload(args) => {
                args.run(&app, &self.global).await?;
            }
        }

        Ok(())
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse_args();
    cli.run().await
}
