//! Upload storage port

use async_trait::async_trait;

use crate::error::UploadError;

/// Public path prefix of every stored upload
pub const UPLOAD_PATH_PREFIX: &str = "/uploads/";

/// A file part received in a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field the file was sent under
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Content types accepted for uploads, with the extension they are stored under
pub const ALLOWED_UPLOAD_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("application/pdf", "pdf"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_UPLOAD_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Persist a file and return the public path it is served from
    async fn store(&self, file: &UploadedFile) -> Result<String, UploadError>;

    /// Remove a previously stored file by its public path
    async fn remove(&self, path: &str) -> Result<(), UploadError>;
}
