//! Bulk image upload command.

use std::path::{Path, PathBuf};

use clap::Args;
use futures::future::join_all;
use serde::Serialize;

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::gallery::{Gallery, SavedImage};

/// File extensions treated as uploadable images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

// =============================================================================
// Bulk Upload
// =============================================================================

/// Arguments for the bulk-upload command.
///
/// With --location, every image directly in DIR is uploaded to that location.
/// Without it, each subdirectory of DIR is treated as a location named after
/// the subdirectory.
#[derive(Args, Debug)]
pub struct BulkUploadArgs {
    /// Directory containing the images to upload.
    pub dir: PathBuf,

    /// Continent name (not slug) to upload into.
    #[arg(long)]
    pub continent: String,

    /// Location name (not slug) to upload into.
    #[arg(long)]
    pub location: Option<String>,

    /// Number of uploads to run at a time.
    #[arg(long, default_value_t = 5)]
    pub parallel: usize,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Serialize)]
struct UploadReportEntry {
    location: String,
    file: String,
    ok: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct UploadReport {
    uploaded: usize,
    total: usize,
    files: Vec<UploadReportEntry>,
}

impl BulkUploadArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let jobs = self.collect_jobs().await?;

        let parallel = self.parallel.max(1);
        let gallery = app.gallery();
        let continent = self.continent.as_str();
        let mut files: Vec<UploadReportEntry> = Vec::with_capacity(jobs.len());

        for chunk in jobs.chunks(parallel) {
            let uploads = chunk.iter().map(|(location, path)| {
                let location = location.clone();
                let path = path.clone();
                async move {
                    let file = match path.file_name().and_then(|name| name.to_str()) {
                        Some(name) => name.to_string(),
                        None => {
                            return UploadReportEntry {
                                location,
                                file: path.display().to_string(),
                                ok: false,
                                url: None,
                                error: Some("invalid file name".to_string()),
                            };
                        }
                    };
                    match upload_one(gallery, continent, &location, &path, &file).await {
                        Ok(saved) => UploadReportEntry {
                            location,
                            file,
                            ok: true,
                            url: Some(saved.url),
                            error: None,
                        },
                        Err(error) => UploadReportEntry {
                            location,
                            file,
                            ok: false,
                            url: None,
                            error: Some(error.to_string()),
                        },
                    }
                }
            });
            files.extend(join_all(uploads).await);
        }

        let report = UploadReport {
            uploaded: files.iter().filter(|entry| entry.ok).count(),
            total: files.len(),
            files,
        };

        if global.json {
            self.output.write(&report, true).await?;
        } else {
            let mut output = String::new();
            for entry in &report.files {
                if entry.ok {
                    output.push_str(&format!("OK   {}/{}\n", entry.location, entry.file));
                } else {
                    output.push_str(&format!(
                        "FAIL {}/{}: {}\n",
                        entry.location,
                        entry.file,
                        entry.error.as_deref().unwrap_or("unknown error")
                    ));
                }
            }
            output.push_str(&format!("Uploaded {} of {}", report.uploaded, report.total));
            self.output.write_str(&output).await?;
        }

        Ok(())
    }

    /// Collect (location, file) upload jobs from the directory layout.
    async fn collect_jobs(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut jobs = Vec::new();

        match &self.location {
            Some(location) => {
                collect_image_files(&self.dir, location, &mut jobs).await?;
            }
            None => {
                let mut entries = tokio::fs::read_dir(&self.dir).await?;
                while let Some(entry) = entries.next_entry().await? {
                    if !entry.file_type().await?.is_dir() {
                        continue;
                    }
                    let path = entry.path();
                    let Some(location) = path.file_name().and_then(|name| name.to_str()) else {
                        continue;
                    };
                    let location = location.to_string();
                    collect_image_files(&path, &location, &mut jobs).await?;
                }
            }
        }

        // Directory iteration order varies, keep the report stable.
        jobs.sort();
        Ok(jobs)
    }
}

async fn collect_image_files(
    dir: &Path,
    location: &str,
    jobs: &mut Vec<(String, PathBuf)>,
) -> Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        if is_image_file(&path) {
            jobs.push((location.to_string(), path));
        }
    }
    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

async fn upload_one(
    gallery: &Gallery,
    continent: &str,
    location: &str,
    path: &Path,
    file_name: &str,
) -> Result<SavedImage> {
    let data = tokio::fs::read(path).await?;
    let saved = gallery
        .save_image(continent, location, data.into(), file_name)
        .await?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("/tmp/lion.jpg")));
        assert!(is_image_file(Path::new("/tmp/lion.JPG")));
        assert!(is_image_file(Path::new("/tmp/lion.webp")));
        assert!(!is_image_file(Path::new("/tmp/notes.txt")));
        assert!(!is_image_file(Path::new("/tmp/noext")));
    }
}
