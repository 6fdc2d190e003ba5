//! Upload store on the local filesystem
//!
//! Files are written under a single directory with generated names and served
//! back under `/uploads/`.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{extension_for, UploadStore, UploadedFile, UPLOAD_PATH_PREFIX};
use crate::error::UploadError;

pub struct LocalUploadStore {
    root: PathBuf,
}

impl LocalUploadStore {
    /// Create the store, making sure the directory exists
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Map a public path back to a file inside the root.
    ///
    /// Anything that is not a plain generated file name is refused.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(UPLOAD_PATH_PREFIX)?;
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        plain.then(|| self.root.join(name))
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn store(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let ext = extension_for(&file.content_type)
            .ok_or_else(|| UploadError::UnsupportedType(file.content_type.clone()))?;
        let name = format!("{}.{}", Uuid::new_v4(), ext);

        tokio::fs::write(self.root.join(&name), &file.bytes).await?;

        tracing::debug!(
            field = %file.field,
            original = %file.filename,
            stored = %name,
            bytes = file.bytes.len(),
            "Upload stored"
        );
        Ok(format!("{}{}", UPLOAD_PATH_PREFIX, name))
    }

    async fn remove(&self, path: &str) -> Result<(), UploadError> {
        let Some(file) = self.resolve(path) else {
            tracing::debug!(path = %path, "Not a stored upload, skipping removal");
            return Ok(());
        };

        match tokio::fs::remove_file(&file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
