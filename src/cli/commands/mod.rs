//! CLI subcommand implementations.

pub mod bulk_upload;
pub mod gallery;
pub mod image;
pub mod location;
