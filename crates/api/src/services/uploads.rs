//! Product image storage on the local filesystem.
//!
//! Images are written as `product-<uuid>.<ext>` into the upload directory and
//! served back under [`PUBLIC_PREFIX`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// URL prefix the upload directory is mounted at.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Accepted MIME types.
const ALLOWED_MIMES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Errors raised while accepting or storing an image.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File too large (max {max} bytes)")]
    TooLarge { max: usize },

    #[error("Only images are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedType,

    #[error("Empty file uploaded")]
    Empty,

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// An image received from a client, fully read into memory.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Lowercase extension of an accepted image, from the client file name.
    ///
    /// Both the extension and the declared MIME type must be on the allow list.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` otherwise.
    pub fn extension(&self) -> Result<&'static str, UploadError> {
        let ext = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let ext = match ext.as_deref() {
            Some("jpeg") => "jpeg",
            Some("jpg") => "jpg",
            Some("png") => "png",
            Some("gif") => "gif",
            Some("webp") => "webp",
            _ => return Err(UploadError::UnsupportedType),
        };

        let mime = self
            .content_type
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_MIMES.contains(&mime.as_str()) {
            return Err(UploadError::UnsupportedType);
        }

        Ok(ext)
    }
}

/// Filesystem-backed image store.
#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
    max_bytes: usize,
}

impl Uploads {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the upload directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Check size and type without touching the disk.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge`, `Empty` or `UnsupportedType`.
    pub fn check(&self, upload: &ImageUpload) -> Result<&'static str, UploadError> {
        if upload.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                max: self.max_bytes,
            });
        }
        if upload.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        upload.extension()
    }

    /// Write the image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error from [`Uploads::check`] or an I/O error.
    pub async fn save(&self, upload: &ImageUpload) -> Result<String, UploadError> {
        let ext = self.check(upload)?;
        let file_name = format!("product-{}.{ext}", Uuid::new_v4());

        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&file_name), &upload.bytes).await?;

        tracing::debug!(file = %file_name, bytes = upload.bytes.len(), "Stored product image");
        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }

    /// Delete a stored image by URL.
    ///
    /// Unknown URLs and already-missing files are ignored; other failures are
    /// logged and swallowed since the row change has already been committed.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.url_to_path(url) else {
            tracing::debug!(url, "Not a stored upload, skipping removal");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed product image"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove product image");
            }
        }
    }

    /// Remove several images.
    pub async fn remove_all(&self, urls: &[String]) {
        for url in urls {
            self.remove(url).await;
        }
    }

    /// Map a public URL back to a file inside the upload directory.
    ///
    /// Returns `None` for anything that is not a single file name directly
    /// under [`PUBLIC_PREFIX`].
    #[must_use]
    pub fn url_to_path(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == ".."
        {
            return None;
        }
        Some(self.dir.join(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png(bytes: usize) -> ImageUpload {
        ImageUpload {
            file_name: Some("Torta.PNG".to_owned()),
            content_type: Some("image/png".to_owned()),
            bytes: vec![0x89; bytes],
        }
    }

    #[test]
    fn test_extension_requires_matching_name_and_mime() {
        assert_eq!(png(1).extension().unwrap(), "png");

        let mut upload = png(1);
        upload.content_type = Some("text/plain".to_owned());
        assert!(matches!(upload.extension(), Err(UploadError::UnsupportedType)));

        let mut upload = png(1);
        upload.file_name = Some("script.exe".to_owned());
        assert!(matches!(upload.extension(), Err(UploadError::UnsupportedType)));

        let mut upload = png(1);
        upload.file_name = None;
        assert!(matches!(upload.extension(), Err(UploadError::UnsupportedType)));
    }

    #[test]
    fn test_check_size_limit() {
        let uploads = Uploads::new("unused", 10);
        assert!(uploads.check(&png(10)).is_ok());
        assert!(matches!(
            uploads.check(&png(11)),
            Err(UploadError::TooLarge { max: 10 })
        ));
        assert!(matches!(uploads.check(&png(0)), Err(UploadError::Empty)));
    }

    #[test]
    fn test_url_to_path_rejects_traversal() {
        let uploads = Uploads::new("/srv/uploads", 10);
        assert_eq!(
            uploads.url_to_path("/uploads/product-1.png"),
            Some(PathBuf::from("/srv/uploads/product-1.png"))
        );
        assert_eq!(uploads.url_to_path("/uploads/../etc/passwd"), None);
        assert_eq!(uploads.url_to_path("/uploads/.."), None);
        assert_eq!(uploads.url_to_path("/uploads/"), None);
        assert_eq!(uploads.url_to_path("https://cdn.example.com/a.png"), None);
        assert_eq!(uploads.url_to_path("/uploadsx/a.png"), None);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path().join("nested"), 1024);

        let url = uploads.save(&png(16)).await.unwrap();
        assert!(url.starts_with("/uploads/product-"));
        assert!(url.ends_with(".png"));

        let path = uploads.url_to_path(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap().len(), 16);

        uploads.remove(&url).await;
        assert!(!path.exists());

        // Second removal is a no-op.
        uploads.remove(&url).await;
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path(), 1024);

        let mut upload = png(16);
        upload.content_type = Some("application/pdf".to_owned());
        assert!(uploads.save(&upload).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
