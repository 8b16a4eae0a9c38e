//! Image operation subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::{CliError, GlobalArgs, OutputSink, Result};

// =============================================================================
// Image Subcommands
// =============================================================================

/// Image operation subcommands.
#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// Upload an image to a location.
    Upload(UploadArgs),

    /// Remove an image by its file id.
    #[command(name = "rm")]
    Remove(RemoveArgs),

    /// Save an image URL as a location's cover photo.
    #[command(name = "set-cover")]
    SetCover(SetCoverArgs),

    /// Show details for an image by its file id.
    Info(InfoArgs),
}

impl ImageCommand {
    /// Run the image subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            ImageCommand::Upload(args) => args.run(app, global).await,
            ImageCommand::Remove(args) => args.run(app, global).await,
            ImageCommand::SetCover(args) => args.run(app, global).await,
            ImageCommand::Info(args) => args.run(app, global).await,
        }
    }
}

// =============================================================================
// Upload
// =============================================================================

/// Arguments for the upload command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Continent name (not slug).
    pub continent: String,

    /// Location name (not slug).
    pub location: String,

    /// Path to the image file to upload.
    pub file: PathBuf,

    #[command(flatten)]
    pub output: OutputSink,
}

impl UploadArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let data = tokio::fs::read(&self.file).await?;
        let file_name = self
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::Other(format!("invalid file name: {}", self.file.display()))
            })?;

        let saved = app
            .gallery()
            .save_image(&self.continent, &self.location, data.into(), &file_name)
            .await?;

        if global.json {
            self.output.write(&saved, true).await?;
        } else {
            self.output.write_str(&saved.url).await?;
        }

        Ok(())
    }
}

// =============================================================================
// Remove
// =============================================================================

/// Arguments for the rm command.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// File id of the image to remove.
    pub file_id: String,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Serialize)]
struct RemovedOutput {
    file_id: String,
}

impl RemoveArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        app.gallery().delete_image(&self.file_id).await?;

        if global.json {
            self.output
                .write(&RemovedOutput { file_id: self.file_id }, true)
                .await?;
        } else {
            self.output
                .write_str(&format!("removed {}", self.file_id))
                .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Set Cover
// =============================================================================

/// Arguments for the set-cover command.
#[derive(Args, Debug)]
pub struct SetCoverArgs {
    /// Continent name (not slug).
    pub continent: String,

    /// Location name (not slug).
    pub location: String,

    /// Image URL to use as the cover.
    pub url: String,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Serialize)]
struct SetCoverOutput {
    continent: String,
    location: String,
    url: String,
}

impl SetCoverArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        app.gallery()
            .set_cover_photo(&self.continent, &self.location, &self.url)
            .await?;

        if global.json {
            self.output
                .write(
                    &SetCoverOutput {
                        continent: self.continent,
                        location: self.location,
                        url: self.url,
                    },
                    true,
                )
                .await?;
        } else {
            self.output
                .write_str(&format!(
                    "cover set for {}/{}",
                    self.continent, self.location
                ))
                .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Info
// =============================================================================

/// Arguments for the info command.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// File id of the image.
    pub file_id: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl InfoArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let details = app.gallery().image_details(&self.file_id).await?;

        if global.json {
            self.output.write(&details, true).await?;
        } else {
            let mut output = String::new();
            output.push_str(&format!("name: {}\n", details.name));
            output.push_str(&format!("path: {}\n", details.path));
            output.push_str(&format!("url: {}\n", details.url));
            if let (Some(width), Some(height)) = (details.width, details.height) {
                output.push_str(&format!("dimensions: {}x{}\n", width, height));
            }
            if let Some(size) = details.size {
                output.push_str(&format!("size: {} bytes\n", size));
            }
            self.output.write_str(output.trim_end()).await?;
        }

        Ok(())
    }
}
