// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image upload models.

use serde::Deserialize;

/// Binary asset picked by the user, before validation.
#[derive(Clone)]
pub struct SelectedAsset {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedAsset {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an asset from disk, inferring the MIME type from the extension.
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime_type = mime_from_extension(&file_name).to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for SelectedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedAsset")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

fn mime_from_extension(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Validated asset awaiting upload, held as a data URL for previews.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub mime_type: String,
    /// Declared size of the original file
    pub size_bytes: usize,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

/// Signed write location issued by the backend. Fetched per upload, never reused.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTarget {
    #[serde(rename = "uploadURL", default)]
    pub upload_url: Option<String>,
}

/// Upload pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Validating,
    AwaitingTarget,
    Transforming,
    Writing,
    /// Holds the public reference of the uploaded image
    Done(String),
    /// Holds the human-readable failure cause
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("photo.JPG"), "image/jpeg");
        assert_eq!(mime_from_extension("icon.png"), "image/png");
        assert_eq!(mime_from_extension("notes.txt"), "application/octet-stream");
        assert_eq!(mime_from_extension("noext"), "application/octet-stream");
    }

    #[test]
    fn test_upload_target_field_name() {
        let target: UploadTarget =
            serde_json::from_str(r#"{"uploadURL":"https://bucket/x.png?sig=1"}"#).unwrap();
        assert_eq!(target.upload_url.as_deref(), Some("https://bucket/x.png?sig=1"));

        let target: UploadTarget = serde_json::from_str("{}").unwrap();
        assert!(target.upload_url.is_none());
    }
}
