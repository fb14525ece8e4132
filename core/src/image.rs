//! Image sources that encode themselves as base64 data URIs.
//!
//! Uploads travel as a JSON string field, not multipart form data. Each
//! source reads its bytes in its own way and produces
//! `data:<mime>;base64,<payload>`. Every failure here is reported as
//! `ApiError::ImageProcessing` so callers can tell it apart from a request
//! that reached the server.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ApiError;
use crate::http::Transport;

const DEFAULT_MIME: &str = "image/jpeg";

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn to_base64(&self) -> Result<String, ApiError>;
}

/// Build a data URI from raw bytes.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Image stored on the local file system.
#[derive(Debug, Clone)]
pub struct FileImage {
    path: PathBuf,
}

impl FileImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn mime(&self) -> String {
        mime_guess::from_path(&self.path)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string())
    }
}

#[async_trait]
impl ImageSource for FileImage {
    async fn to_base64(&self) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ApiError::ImageProcessing(format!("{}: {}", self.path.display(), e)))?;
        if bytes.is_empty() {
            return Err(ApiError::ImageProcessing(format!(
                "{}: file is empty",
                self.path.display()
            )));
        }
        Ok(data_uri(&self.mime(), &bytes))
    }
}

/// Image addressed by URI and fetched through a `Transport`, the way a
/// browser-like host resolves a blob reference.
#[derive(Clone)]
pub struct BlobImage {
    uri: String,
    transport: Arc<dyn Transport>,
}

impl BlobImage {
    pub fn new(uri: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            uri: uri.into(),
            transport,
        }
    }
}

#[async_trait]
impl ImageSource for BlobImage {
    async fn to_base64(&self) -> Result<String, ApiError> {
        let (bytes, content_type) = self
            .transport
            .fetch_bytes(&self.uri)
            .await
            .map_err(|e| ApiError::ImageProcessing(format!("{}: {}", self.uri, e)))?;
        if bytes.is_empty() {
            return Err(ApiError::ImageProcessing(format!("{}: blob is empty", self.uri)));
        }
        let mime = content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or(DEFAULT_MIME);
        Ok(data_uri(mime, &bytes))
    }
}
