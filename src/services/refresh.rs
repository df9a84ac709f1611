// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token refresh: exchanges the refresh token for a new access token.
//!
//! Concurrent callers that saw the same access token rejected share one
//! in-flight exchange and observe the same outcome, including a network
//! failure. The exchange is forgotten once it settles, so a later 401 starts
//! a new one. A missing or rejected refresh token ends the session: the
//! store is cleared, the user is notified and `SessionEvent::Expired` is
//! broadcast, once per exchange.

use crate::error::{ClientError, Result};
use crate::models::{RefreshResponse, SessionEvent};
use crate::services::{CredentialStore, Notifier};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, OnceCell};

/// Message shown when credential repair fails.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Outcome shared by every caller attached to one exchange.
#[derive(Debug, Clone)]
enum Settled {
    Refreshed(String),
    NoRefreshToken,
    Rejected { status: u16 },
    /// Network failure or timeout; the session is left in place
    Unreachable(String),
}

impl Settled {
    fn into_result(self) -> Result<String> {
        match self {
            Settled::Refreshed(token) => Ok(token),
            Settled::NoRefreshToken => Err(ClientError::NoRefreshToken),
            Settled::Rejected { status } => Err(ClientError::RefreshRejected { status }),
            Settled::Unreachable(cause) => Err(ClientError::RefreshUnavailable(cause)),
        }
    }
}

/// One refresh exchange, keyed by the access token it replaces.
struct InFlightRefresh {
    replaces: Option<String>,
    outcome: OnceCell<Settled>,
}

struct RefresherInner {
    http: reqwest::Client,
    refresh_url: String,
    store: CredentialStore,
    notifier: Notifier,
    events: broadcast::Sender<SessionEvent>,
    /// Exchange in flight; cleared once it settles
    latest: Mutex<Option<Arc<InFlightRefresh>>>,
}

/// Token refresh unit. Cloning shares the in-flight state.
#[derive(Clone)]
pub struct TokenRefresher {
    inner: Arc<RefresherInner>,
}

impl TokenRefresher {
    pub fn new(
        http: reqwest::Client,
        refresh_url: String,
        store: CredentialStore,
        notifier: Notifier,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                http,
                refresh_url,
                store,
                notifier,
                events,
                latest: Mutex::new(None),
            }),
        }
    }

    /// Replace the current access token with a freshly minted one.
    pub async fn refresh(&self) -> Result<String> {
        self.refresh_replacing(self.inner.store.access_token())
            .await
    }

    /// Refresh after `rejected` was refused by the server.
    ///
    /// Returns immediately when the store already holds a different token,
    /// since another caller has completed the repair.
    pub async fn refresh_replacing(&self, rejected: Option<String>) -> Result<String> {
        if let Some(current) = self.inner.store.access_token() {
            if rejected.as_deref() != Some(current.as_str()) {
                return Ok(current);
            }
        }

        let flight = {
            let mut latest = self.inner.latest.lock();
            match latest.as_ref() {
                Some(flight) if flight.replaces == rejected => flight.clone(),
                _ => {
                    let flight = Arc::new(InFlightRefresh {
                        replaces: rejected,
                        outcome: OnceCell::new(),
                    });
                    *latest = Some(flight.clone());
                    flight
                }
            }
        };

        let settled = flight
            .outcome
            .get_or_init(|| self.exchange())
            .await
            .clone();

        // Attached callers keep their Arc; new 401s start a fresh exchange
        {
            let mut latest = self.inner.latest.lock();
            if latest.as_ref().is_some_and(|l| Arc::ptr_eq(l, &flight)) {
                latest.take();
            }
        }

        settled.into_result()
    }

    /// Drop the remembered exchange. Called when a session starts or ends.
    pub fn forget(&self) {
        self.inner.latest.lock().take();
    }

    async fn exchange(&self) -> Settled {
        let Some(refresh_token) = self.inner.store.refresh_token() else {
            tracing::warn!("Access token rejected and no refresh token available");
            self.end_session();
            return Settled::NoRefreshToken;
        };

        tracing::info!("Access token expired, refreshing");

        let response = match self
            .inner
            .http
            .post(&self.inner.refresh_url)
            .bearer_auth(&refresh_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh request failed");
                return Settled::Unreachable(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Token refresh rejected");
            self.end_session();
            return Settled::Rejected {
                status: status.as_u16(),
            };
        }

        let body: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                tracing::warn!(error = %e, "Token refresh response timed out");
                return Settled::Unreachable(e.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed token refresh response");
                self.end_session();
                return Settled::Rejected {
                    status: status.as_u16(),
                };
            }
        };

        let access_token = body.access_token.clone();
        if !self
            .inner
            .store
            .replace_tokens(&refresh_token, body.access_token, body.refresh_token)
        {
            // Logout or a new login happened while the exchange was in flight
            tracing::info!("Session changed during refresh, discarding refreshed token");
            return Settled::NoRefreshToken;
        }

        tracing::info!("Token refreshed");
        Settled::Refreshed(access_token)
    }

    fn end_session(&self) {
        self.inner.store.clear();
        self.inner.notifier.error(SESSION_EXPIRED_MESSAGE);
        // No subscribers is fine; the UI may not be listening
        let _ = self.inner.events.send(SessionEvent::Expired);
    }
}
