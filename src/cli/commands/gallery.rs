//! Gallery view subcommands.

use clap::{Args, Subcommand};

use crate::app::App;
use crate::cli::{CliError, GlobalArgs, OutputSink, Result};
use crate::gallery::{Continent, Location};

// =============================================================================
// Gallery Subcommands
// =============================================================================

/// Gallery view subcommands.
#[derive(Subcommand, Debug)]
pub enum GalleryCommand {
    /// Show continents, or one continent by slug.
    Continents(ContinentsArgs),

    /// Show a continent's locations, or one location by slug.
    Locations(LocationsArgs),

    /// Show a lightweight list of continent slugs and names.
    #[command(name = "continent-list")]
    ContinentList(ContinentListArgs),

    /// Show images for a location.
    Images(ImagesArgs),

    /// Show the full gallery folder structure.
    Structure(StructureArgs),

    /// Show locations with the most images.
    Featured(FeaturedArgs),
}

impl GalleryCommand {
    /// Run the gallery subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            GalleryCommand::Continents(args) => args.run(app, global).await,
            GalleryCommand::Locations(args) => args.run(app, global).await,
            GalleryCommand::ContinentList(args) => args.run(app, global).await,
            GalleryCommand::Images(args) => args.run(app, global).await,
            GalleryCommand::Structure(args) => args.run(app, global).await,
            GalleryCommand::Featured(args) => args.run(app, global).await,
        }
    }
}

fn push_location_line(output: &mut String, indent: usize, location: &Location) {
    output.push_str(&" ".repeat(indent));
    output.push_str(&format!(
        "{} ({}): {}, {} images\n",
        location.name, location.slug, location.country, location.image_count
    ));
}

fn push_continent_lines(output: &mut String, continent: &Continent) {
    output.push_str(&format!(
        "{} ({}): {} locations, {} images\n",
        continent.name, continent.slug, continent.location_count, continent.total_images
    ));
    for location in &continent.locations {
        push_location_line(output, 4, location);
    }
}

// =============================================================================
// Continents
// =============================================================================

/// Arguments for the continents command.
#[derive(Args, Debug)]
pub struct ContinentsArgs {
    /// Optional continent slug to show a single continent.
    pub slug: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ContinentsArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let gallery = app.gallery();

        match self.slug {
            Some(ref slug) => {
                let continent = gallery
                    .continent(slug)
                    .await
                    .ok_or_else(|| CliError::Other(format!("continent not found: {}", slug)))?;

                if global.json {
                    self.output.write(&continent, true).await?;
                } else {
                    let mut output = String::new();
                    push_continent_lines(&mut output, &continent);
                    self.output.write_str(output.trim_end()).await?;
                }
            }
            None => {
                let continents = gallery.continents().await;

                if global.json {
                    self.output.write(&*continents, true).await?;
                } else {
                    let mut output = String::new();
                    for continent in continents.iter() {
                        push_continent_lines(&mut output, continent);
                    }
                    self.output.write_str(output.trim_end()).await?;
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Arguments for the locations command.
#[derive(Args, Debug)]
pub struct LocationsArgs {
    /// Continent slug.
    pub continent_slug: String,

    /// Optional location slug to show a single location.
    pub location_slug: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl LocationsArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let gallery = app.gallery();

        match self.location_slug {
            Some(ref location_slug) => {
                let location = gallery
                    .location(&self.continent_slug, location_slug)
                    .await
                    .ok_or_else(|| {
                        CliError::Other(format!("location not found: {}", location_slug))
                    })?;

                if global.json {
                    self.output.write(&location, true).await?;
                } else {
                    let mut output = String::new();
                    push_location_line(&mut output, 0, &location);
                    output.push_str(&format!("    {}\n", location.description));
                    if !location.wildlife.is_empty() {
                        output.push_str(&format!("    wildlife: {}\n", location.wildlife.join(", ")));
                    }
                    self.output.write_str(output.trim_end()).await?;
                }
            }
            None => {
                let locations = gallery.locations(&self.continent_slug).await;

                if global.json {
                    self.output.write(&locations, true).await?;
                } else {
                    let mut output = String::new();
                    for location in &locations {
                        push_location_line(&mut output, 0, location);
                    }
                    self.output.write_str(output.trim_end()).await?;
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Continent List
// =============================================================================

/// Arguments for the continent-list command.
#[derive(Args, Debug)]
pub struct ContinentListArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl ContinentListArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let list = app.gallery().continents_list().await;

        if global.json {
            self.output.write(&list, true).await?;
        } else {
            let mut output = String::new();
            for entry in &list {
                output.push_str(&format!("{} ({})\n", entry.name, entry.slug));
            }
            self.output.write_str(output.trim_end()).await?;
        }

        Ok(())
    }
}

// =============================================================================
// Images
// =============================================================================

/// Arguments for the images command.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Continent slug.
    pub continent_slug: String,

    /// Location slug.
    pub location_slug: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ImagesArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let images = app
            .gallery()
            .images(&self.continent_slug, &self.location_slug)
            .await;

        if global.json {
            self.output.write(&*images, true).await?;
        } else if images.is_empty() {
            self.output.write_str("(no images)").await?;
        } else {
            let mut output = String::new();
            for image in images.iter() {
                output.push_str(&format!("{} ({})\n", image.file_name, image.src));
            }
            self.output.write_str(output.trim_end()).await?;
        }

        Ok(())
    }
}

// =============================================================================
// Structure
// =============================================================================

/// Arguments for the structure command.
#[derive(Args, Debug)]
pub struct StructureArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl StructureArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let structure = app.gallery().full_structure().await;

        if global.json {
            self.output.write(&structure, true).await?;
        } else {
            let mut output = String::new();
            for continent in &structure {
                output.push_str(&continent.name);
                output.push_str("/\n");
                for location in &continent.locations {
                    output.push_str(&" ".repeat(4));
                    output.push_str(&location.name);
                    output.push_str("/\n");
                    for image in &location.images {
                        output.push_str(&" ".repeat(8));
                        output.push_str(&image.name);
                        if image.is_cover {
                            output.push_str(" (cover)");
                        }
                        output.push('\n');
                    }
                }
            }
            self.output.write_str(output.trim_end()).await?;
        }

        Ok(())
    }
}

// =============================================================================
// Featured
// =============================================================================

/// Arguments for the featured command.
#[derive(Args, Debug)]
pub struct FeaturedArgs {
    /// Maximum number of locations to show.
    #[arg(long, default_value_t = 4)]
    pub limit: usize,

    #[command(flatten)]
    pub output: OutputSink,
}

impl FeaturedArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let featured = app.gallery().featured_locations(self.limit).await;

        if global.json {
            self.output.write(&featured, true).await?;
        } else {
            let mut output = String::new();
            for location in &featured {
                output.push_str(&format!(
                    "{} ({}/{}): {} images\n",
                    location.name, location.continent_slug, location.slug, location.image_count
                ));
            }
            self.output.write_str(output.trim_end()).await?;
        }

        Ok(())
    }
}
