use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::api::AuthError;

/// Multipart field name the server reads the image from
pub const UPLOAD_FIELD: &str = "image";

/// Largest accepted image (5 MB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A validated image ready to send to `POST /upload`
#[derive(Debug, Clone)]
pub struct ImageUpload {
    file_name: String,
    mime: &'static str,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate an in-memory image.
    ///
    /// Only JPG/JPEG and PNG files (by extension) up to `MAX_UPLOAD_BYTES` are accepted.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AuthError> {
        let file_name = file_name.into();
        let mime = mime_for(&file_name).ok_or_else(|| {
            AuthError::InvalidUpload(format!(
                "{}: accepted formats are JPG and PNG",
                file_name
            ))
        })?;

        if bytes.is_empty() {
            return Err(AuthError::InvalidUpload(format!("{} is empty", file_name)));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AuthError::InvalidUpload(format!(
                "{} is {} bytes, max size is 5MB",
                file_name,
                bytes.len()
            )));
        }

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Read and validate an image from disk
    pub fn from_path(path: &Path) -> Result<Self, AuthError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AuthError::InvalidUpload(format!("{} is not a file", path.display())))?
            .to_string();

        // Reject by extension before reading a possibly large file
        if mime_for(&file_name).is_none() {
            return Err(AuthError::InvalidUpload(format!(
                "{}: accepted formats are JPG and PNG",
                file_name
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            AuthError::InvalidUpload(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::new(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Build the multipart body with the image under `UPLOAD_FIELD`
    pub fn into_form(self) -> Result<Form, AuthError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime)
            .map_err(|e| AuthError::InvalidUpload(e.to_string()))?;
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

fn mime_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Successful `/upload` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: String,
}
