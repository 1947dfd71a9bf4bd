use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Handle to a stored image; `url` is opaque to everything above the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRef {
    pub url: String,
    pub content_hash: String,
    pub content_type: &'static str,
    pub size: usize,
}

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("upload is empty")]
    Empty,
    #[error("upload of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("blob write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(
        &self,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobRef, BlobStoreError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    fn sniff(data: &[u8]) -> Option<Self> {
        const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(PNG) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Content-addressed image storage on local disk, sharded as
/// `{base}/{first two hex chars}/{sha256}.{ext}`.
pub struct DiskBlobStore {
    base_path: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl DiskBlobStore {
    pub fn new(base_path: PathBuf, public_base_url: String, max_bytes: usize) -> Self {
        Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    fn content_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    fn relative_path(hash: &str, format: ImageFormat) -> String {
        format!("{}/{}.{}", &hash[..2], hash, format.extension())
    }

    /// Writes to a staging file private to this call, then renames it into place.
    /// Concurrent writers of the same content each rename a complete file, so the
    /// final path only ever holds whole blobs.
    async fn write_new(path: &Path, data: &[u8]) -> Result<(), BlobStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let staging = path.with_extension(format!("{}.partial", Uuid::new_v4().simple()));
        if let Err(err) = fs::write(&staging, data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&staging, path).await {
            let _ = fs::remove_file(&staging).await;
            // Another writer already placed identical content.
            if fs::try_exists(path).await.unwrap_or(false) {
                return Ok(());
            }
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn store(
        &self,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobRef, BlobStoreError> {
        if data.is_empty() {
            return Err(BlobStoreError::Empty);
        }
        if data.len() > self.max_bytes {
            return Err(BlobStoreError::TooLarge {
                size: data.len(),
                max: self.max_bytes,
            });
        }
        let Some(format) = ImageFormat::sniff(&data) else {
            return Err(BlobStoreError::UnsupportedFormat(
                content_type.unwrap_or("unknown").to_string(),
            ));
        };

        let hash = Self::content_hash(&data);
        let relative = Self::relative_path(&hash, format);
        let path = self.base_path.join(&relative);

        if fs::try_exists(&path).await? {
            tracing::debug!(%hash, "blob already stored");
        } else {
            Self::write_new(&path, &data).await?;
            tracing::info!(%hash, size = data.len(), "stored blob");
        }

        Ok(BlobRef {
            url: format!("{}/{}", self.public_base_url, relative),
            content_hash: hash,
            content_type: format.mime_type(),
            size: data.len(),
        })
    }
}
