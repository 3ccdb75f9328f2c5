use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;
use rand::{distributions::Alphanumeric, Rng};

pub const MEDIA_URL: &str = "/media/";
const POST_IMAGE_DIR: &str = "posts";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Upload a valid image.")]
    InvalidImage,
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores a post image and returns its path relative to the media root.
    pub async fn save_post_image(&self, bytes: &[u8]) -> Result<String, MediaError> {
        let format = sniff_image(bytes)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let relative = format!("{POST_IMAGE_DIR}/{suffix}.{extension}");

        let dir = self.root.join(POST_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create media directory {}", dir.display()))?;
        let path = self.root.join(&relative);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %relative, "stored post image");
        Ok(relative)
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<()> {
        let path = self.root.join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    pub async fn exists(&self, relative: &str) -> bool {
        tokio::fs::try_exists(self.root.join(relative))
            .await
            .unwrap_or(false)
    }
}

pub fn media_url(relative: &str) -> String {
    format!("{MEDIA_URL}{relative}")
}

fn sniff_image(bytes: &[u8]) -> Result<ImageFormat, MediaError> {
    image::guess_format(bytes).map_err(|_| MediaError::InvalidImage)
}

/// Checks that an upload looks like an image without storing it.
pub fn validate_image(bytes: &[u8]) -> Result<(), MediaError> {
    sniff_image(bytes).map(|_| ())
}
