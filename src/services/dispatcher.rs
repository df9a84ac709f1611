// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated request dispatcher.
//!
//! Handles:
//! - JSON content type by default (caller headers win)
//! - Bearer credential attachment from the credential store
//! - One refresh-and-retry when the server answers 401
//!
//! Any other status is handed back unmodified. Transport failures are never
//! retried and never reach the refresh path.

use crate::error::{ClientError, Result};
use crate::models::ApiMessage;
use crate::services::{CredentialStore, TokenRefresher};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A request that can be issued more than once.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let encoded = serde_json::to_vec(body)
            .map_err(|e| ClientError::Decode(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }
}

/// Dispatcher shared by every caller that reaches the catalog API.
#[derive(Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
    store: CredentialStore,
    refresher: TokenRefresher,
}

impl Dispatcher {
    pub fn new(http: reqwest::Client, store: CredentialStore, refresher: TokenRefresher) -> Self {
        Self {
            http,
            store,
            refresher,
        }
    }

    /// Issue `spec` with credentials, repairing a single expired credential.
    ///
    /// A refresh failure is returned as the error of this call; the session
    /// has already been torn down by then.
    pub async fn send(&self, spec: RequestSpec) -> Result<reqwest::Response> {
        let mut headers = default_headers(&spec.headers);

        let presented = if headers.contains_key(AUTHORIZATION) {
            presented_bearer(&headers)
        } else {
            let token = self.store.access_token();
            if let Some(token) = &token {
                headers.insert(AUTHORIZATION, bearer_value(token)?);
            }
            token
        };

        let response = self.issue(&spec, headers.clone()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!(
            method = %spec.method,
            url = %spec.url,
            "Request unauthorized, refreshing credentials"
        );

        let token = self.refresher.refresh_replacing(presented).await?;
        headers.insert(AUTHORIZATION, bearer_value(&token)?);

        // Exactly one retry; a second 401 goes back to the caller as-is
        self.issue(&spec, headers).await
    }

    /// Issue `spec` without credentials and without the refresh path.
    pub async fn send_public(&self, spec: RequestSpec) -> Result<reqwest::Response> {
        let headers = default_headers(&spec.headers);
        self.issue(&spec, headers).await
    }

    async fn issue(&self, spec: &RequestSpec, headers: HeaderMap) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .request(spec.method.clone(), &spec.url)
            .headers(headers);
        if let Some(body) = &spec.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        tracing::debug!(
            method = %spec.method,
            url = %spec.url,
            status = response.status().as_u16(),
            "Request completed"
        );
        Ok(response)
    }
}

fn default_headers(caller: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for name in caller.keys() {
        headers.remove(name);
    }
    // Multi-valued caller headers keep every value
    for (name, value) in caller {
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn bearer_value(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ClientError::Validation("Access token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn presented_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Pass a 2xx response through; turn anything else into `ClientError::Http`
/// carrying the server's `msg`.
pub async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .ok()
        .and_then(|m| m.text().map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Check status and parse a JSON body.
pub async fn json_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = expect_success(response).await?;
    let raw = response.bytes().await?;
    serde_json::from_slice(&raw).map_err(|e| ClientError::Decode(format!("JSON parse error: {}", e)))
}
