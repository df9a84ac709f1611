// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Catalog client: authenticated access to the product catalog API.
//!
//! This crate provides the request pipeline (bearer attachment with
//! transparent token renewal), the direct-to-storage image upload protocol
//! and the session/notification state the UI layer binds to.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

use config::Config;
use error::Result;
use models::SessionEvent;
use services::{
    CatalogService, CredentialStore, Dispatcher, Notifier, TokenRefresher, UploadPipeline,
};
use tokio::sync::broadcast;

/// Capacity of the session event channel.
const SESSION_EVENT_CAPACITY: usize = 16;

/// Application shell: owns the shared client state and wires the services.
pub struct CatalogApp {
    pub config: Config,
    pub store: CredentialStore,
    pub notifier: Notifier,
    pub dispatcher: Dispatcher,
    pub catalog: CatalogService,
    http: reqwest::Client,
    events: broadcast::Sender<SessionEvent>,
}

impl CatalogApp {
    /// Build the client, restoring the session from the profile directory
    /// when one is configured.
    pub fn new(config: Config) -> Result<Self> {
        let store = match &config.profile_dir {
            Some(dir) => CredentialStore::in_profile(dir),
            None => CredentialStore::in_memory(),
        };
        Self::with_parts(config, store, Notifier::new())
    }

    /// Build the client around an existing store and notifier.
    pub fn with_parts(config: Config, store: CredentialStore, notifier: Notifier) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        let refresher = TokenRefresher::new(
            http.clone(),
            config.refresh_url(),
            store.clone(),
            notifier.clone(),
            events.clone(),
        );
        let dispatcher = Dispatcher::new(http.clone(), store.clone(), refresher.clone());
        let catalog = CatalogService::new(
            config.clone(),
            dispatcher.clone(),
            store.clone(),
            refresher,
            notifier.clone(),
            events.clone(),
        );

        Ok(Self {
            config,
            store,
            notifier,
            dispatcher,
            catalog,
            http,
            events,
        })
    }

    /// Session transitions for the UI (login surface on `Expired`).
    pub fn subscribe_session(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Fresh upload pipeline for one product form.
    pub fn upload_pipeline(&self) -> UploadPipeline {
        UploadPipeline::new(
            self.http.clone(),
            self.dispatcher.clone(),
            self.notifier.clone(),
            self.config.upload_url_endpoint.clone(),
            self.config.max_upload_bytes,
        )
    }
}
