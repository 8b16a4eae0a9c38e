//! Location management subcommands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::gallery::NewLocation;
use crate::metadata::LocationUpdate;

// =============================================================================
// Location Subcommands
// =============================================================================

/// Location management subcommands.
#[derive(Subcommand, Debug)]
pub enum LocationCommand {
    /// Add a location to a continent.
    Add(AddArgs),

    /// Remove a location, its images, and its stored cover.
    #[command(name = "rm")]
    Remove(RemoveArgs),

    /// Update a location's details.
    Update(UpdateArgs),
}

impl LocationCommand {
    /// Run the location subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            LocationCommand::Add(args) => args.run(app, global).await,
            LocationCommand::Remove(args) => args.run(app, global).await,
            LocationCommand::Update(args) => args.run(app, global).await,
        }
    }
}

// =============================================================================
// Add
// =============================================================================

/// Arguments for the add command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Continent slug to add the location under.
    pub continent_slug: String,

    /// Location name.
    #[arg(long)]
    pub name: String,

    /// Country the location is in.
    #[arg(long)]
    pub country: String,

    /// Location description.
    #[arg(long)]
    pub description: Option<String>,

    /// Wildlife species (repeatable).
    #[arg(long)]
    pub wildlife: Vec<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl AddArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let new = NewLocation {
            name: self.name,
            country: self.country,
            description: self.description,
            wildlife: self.wildlife,
        };
        let location = app.gallery().add_location(&self.continent_slug, new).await?;

        if global.json {
            self.output.write(&location, true).await?;
        } else {
            self.output
                .write_str(&format!("added {} ({})", location.name, location.slug))
                .await?;
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
    /// Continent slug.
    pub continent_slug: String,

    /// Location slug.
    pub location_slug: String,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Serialize)]
struct RemovedOutput {
    continent_slug: String,
    location_slug: String,
}

impl RemoveArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        app.gallery()
            .delete_location(&self.continent_slug, &self.location_slug)
            .await?;

        if global.json {
            self.output
                .write(
                    &RemovedOutput {
                        continent_slug: self.continent_slug,
                        location_slug: self.location_slug,
                    },
                    true,
                )
                .await?;
        } else {
            self.output
                .write_str(&format!(
                    "removed {}/{}",
                    self.continent_slug, self.location_slug
                ))
                .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Update
// =============================================================================

/// Arguments for the update command.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Continent slug.
    pub continent_slug: String,

    /// Location slug.
    pub location_slug: String,

    /// New description.
    #[arg(long)]
    pub description: Option<String>,

    /// New country.
    #[arg(long)]
    pub country: Option<String>,

    /// New wildlife species (repeatable, replaces the existing list).
    #[arg(long)]
    pub wildlife: Option<Vec<String>>,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Serialize)]
struct UpdatedOutput {
    continent_slug: String,
    location_slug: String,
}

impl UpdateArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let update = LocationUpdate {
            description: self.description,
            wildlife: self.wildlife,
            country: self.country,
        };
        app.gallery()
            .update_location(&self.continent_slug, &self.location_slug, update)
            .await?;

        if global.json {
            self.output
                .write(
                    &UpdatedOutput {
                        continent_slug: self.continent_slug,
                        location_slug: self.location_slug,
                    },
                    true,
                )
                .await?;
        } else {
            self.output
                .write_str(&format!(
                    "updated {}/{}",
                    self.continent_slug, self.location_slug
                ))
                .await?;
        }

        Ok(())
    }
}
