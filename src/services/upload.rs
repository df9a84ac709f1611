// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Two-phase image upload: request a signed write location, then write the
//! bytes straight to storage.
//!
//! The selected asset is validated before anything touches the network and
//! is held as a data URL for previews. Only the query-free public reference
//! of the written object ever leaves the pipeline.

use crate::error::{format_size, ClientError, Result};
use crate::models::{PendingUpload, SelectedAsset, UploadState, UploadTarget};
use crate::services::dispatcher::{Dispatcher, RequestSpec};
use crate::services::Notifier;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// Upload pipeline for one product form.
pub struct UploadPipeline {
    /// Client for the signed write; never carries the bearer credential
    storage_http: reqwest::Client,
    dispatcher: Dispatcher,
    notifier: Notifier,
    upload_url_endpoint: String,
    max_bytes: usize,
    pending: Option<PendingUpload>,
    state: UploadState,
}

impl UploadPipeline {
    pub fn new(
        storage_http: reqwest::Client,
        dispatcher: Dispatcher,
        notifier: Notifier,
        upload_url_endpoint: String,
        max_bytes: usize,
    ) -> Self {
        Self {
            storage_http,
            dispatcher,
            notifier,
            upload_url_endpoint,
            max_bytes,
            pending: None,
            state: UploadState::Idle,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingUpload> {
        self.pending.as_ref()
    }

    pub fn preview_data_url(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.data_url.as_str())
    }

    /// Validate and stage `asset`. A rejected asset leaves nothing staged.
    pub fn select(&mut self, asset: SelectedAsset) -> Result<()> {
        self.state = UploadState::Validating;

        if let Err(e) = validate_asset(&asset, self.max_bytes) {
            tracing::warn!(
                file_name = %asset.file_name,
                mime_type = %asset.mime_type,
                size = asset.size_bytes(),
                error = %e,
                "Rejected selected image"
            );
            self.pending = None;
            self.state = UploadState::Idle;
            self.notifier.error(e.user_message());
            return Err(e);
        }

        let mime_type = normalize_mime_type(&asset.mime_type).to_lowercase();
        self.pending = Some(PendingUpload {
            data_url: encode_data_url(&mime_type, &asset.bytes),
            size_bytes: asset.size_bytes(),
            file_name: asset.file_name,
            mime_type,
        });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.pending = None;
        self.state = UploadState::Idle;
    }

    /// Upload the staged asset and return its public reference.
    ///
    /// With nothing staged, `existing` is returned unchanged and no request
    /// is made. The staged asset is consumed whatever the outcome.
    pub async fn upload(&mut self, existing: Option<&str>) -> Result<Option<String>> {
        let Some(pending) = self.pending.take() else {
            self.state = UploadState::Idle;
            return Ok(existing.map(str::to_string));
        };

        match self.run(&pending).await {
            Ok(reference) => {
                tracing::info!(file_name = %pending.file_name, "Image uploaded");
                self.state = UploadState::Done(reference.clone());
                self.notifier.success("Image uploaded successfully");
                Ok(Some(reference))
            }
            Err(e) => {
                tracing::warn!(file_name = %pending.file_name, error = %e, "Image upload failed");
                let cause = e.user_message();
                self.state = UploadState::Failed(cause.clone());
                if !e.is_session_ended() {
                    self.notifier.error(cause);
                }
                Err(e)
            }
        }
    }

    async fn run(&mut self, pending: &PendingUpload) -> Result<String> {
        self.state = UploadState::AwaitingTarget;
        let write_url = self.fetch_target().await?;

        self.state = UploadState::Transforming;
        let bytes = transform(pending, self.max_bytes)?;

        self.state = UploadState::Writing;
        self.notifier.info("Uploading image...");

        let response = self
            .storage_http
            .put(write_url.clone())
            .header(CONTENT_TYPE, pending.mime_type.as_str())
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UploadRejected {
                status: status.as_u16(),
            });
        }

        Ok(public_reference(&write_url))
    }

    /// Ask the backend for a fresh signed write location.
    async fn fetch_target(&self) -> Result<Url> {
        let response = self
            .dispatcher
            .send(RequestSpec::get(&self.upload_url_endpoint))
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Upload target request failed");
            return Err(ClientError::NoUploadTarget);
        }

        let target: UploadTarget = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Unreadable upload target response");
            ClientError::NoUploadTarget
        })?;

        target
            .upload_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .and_then(|u| Url::parse(u).ok())
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or(ClientError::NoUploadTarget)
    }
}

/// Strip parameters from a MIME type ("image/png; q=1" -> "image/png").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

fn validate_asset(asset: &SelectedAsset, max_bytes: usize) -> Result<()> {
    let mime_type = normalize_mime_type(&asset.mime_type).to_lowercase();
    if !mime_type.starts_with("image/") || mime_type.len() == "image/".len() {
        return Err(ClientError::Validation(
            "Please select an image file.".to_string(),
        ));
    }

    if asset.bytes.is_empty() {
        return Err(ClientError::Validation(
            "The selected image is empty.".to_string(),
        ));
    }

    if asset.size_bytes() > max_bytes {
        return Err(ClientError::Validation(format!(
            "Image must be smaller than {}.",
            format_size(max_bytes)
        )));
    }

    Ok(())
}

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Decode a base64 data URL into its MIME type and raw bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ClientError::Decode("Not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ClientError::Decode("Data URL has no payload".to_string()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| ClientError::Decode("Data URL is not base64 encoded".to_string()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| ClientError::Decode(format!("Invalid base64 payload: {}", e)))?;
    Ok((mime_type.to_string(), bytes))
}

/// Turn the staged data URL back into the exact bytes to write.
fn transform(pending: &PendingUpload, max_bytes: usize) -> Result<Vec<u8>> {
    let (_, bytes) = decode_data_url(&pending.data_url)?;
    if bytes.len() > max_bytes {
        return Err(ClientError::PayloadTooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    Ok(bytes)
}

/// Public reference of a written object: the write URL minus its signature.
pub fn public_reference(write_url: &Url) -> String {
    let mut reference = write_url.clone();
    reference.set_query(None);
    reference.set_fragment(None);
    reference.to_string()
}
