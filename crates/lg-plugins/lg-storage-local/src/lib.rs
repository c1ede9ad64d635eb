//! # lg-storage-local
//!
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and thumbnailing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::io::Reader as ImageReader;
use lg_core::error::{AppError, Result};
use lg_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix,
        }
    }

    /// Generates a sharded path: "ab/cd/ef...hash"
    fn sharded_path(&self, hash: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(hash);
        path
    }

    /// Internal helper to generate a 250px WebP thumbnail.
    async fn generate_thumbnail(&self, source_path: &Path, hash: &str) -> Result<()> {
        let data = fs::read(source_path).await.map_err(AppError::internal)?;
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(AppError::internal)?
            .decode()
            .map_err(AppError::internal)?;

        let thumb = img.thumbnail(250, 250);
        let mut thumb_path = source_path
            .parent()
            .ok_or_else(|| AppError::internal("upload path has no parent"))?
            .to_path_buf();
        thumb_path.push(format!("thumb_{hash}.webp"));

        thumb
            .save_with_format(thumb_path, image::ImageFormat::WebP)
            .map_err(AppError::internal)?;
        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(AppError::ValidationError("empty upload".into()));
        }
        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationError(format!(
                "unsupported content type: {content_type}"
            )));
        }

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = format!("{:x}", hasher.finalize());

        let target_path = self.sharded_path(&hash);
        let parent = target_path
            .parent()
            .ok_or_else(|| AppError::internal("upload path has no parent"))?;
        fs::create_dir_all(parent).await.map_err(AppError::internal)?;

        if !target_path.exists() {
            fs::write(&target_path, &data)
                .await
                .map_err(AppError::internal)?;
            self.generate_thumbnail(&target_path, &hash).await?;
        }

        Ok(hash)
    }

    fn public_url(&self, media_id: &str) -> String {
        let rel_path = format!("{}/{}/{}", &media_id[0..2], &media_id[2..4], media_id);
        format!("{}/{}", self.url_prefix, rel_path)
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        let rel_path = format!(
            "{}/{}/thumb_{}.webp",
            &media_id[0..2],
            &media_id[2..4],
            media_id
        );
        format!("{}/{}", self.url_prefix, rel_path)
    }
}
