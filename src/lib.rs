//! safari-gallery - A Rust backend for a safari tourism photo gallery.

pub mod app;
pub mod cli;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod media_store;
pub mod metadata;

pub use app::{App, AppContext};

pub use gallery::{
    Continent, ContinentSummary, FeaturedLocation, Gallery, GalleryError, GalleryImage, Location,
    NewLocation, SavedImage, StructureContinent, StructureImage, StructureLocation,
};
