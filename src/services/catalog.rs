// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog operations: session management and product CRUD.
//!
//! Every failure is returned to the caller and also surfaced on the
//! notification channel. Session-ending failures were already announced by
//! the refresh unit and are not announced twice.

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{
    ApiMessage, CredentialPair, Identity, LoginResponse, Product, ProductDraft, ProductInput,
    SessionEvent,
};
use crate::services::dispatcher::{expect_success, json_body, Dispatcher, RequestSpec};
use crate::services::{CredentialStore, Notifier, TokenRefresher, UploadPipeline};
use serde::Serialize;
use tokio::sync::broadcast;
use validator::Validate;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// High-level catalog client used by the UI layer.
#[derive(Clone)]
pub struct CatalogService {
    config: Config,
    dispatcher: Dispatcher,
    store: CredentialStore,
    refresher: TokenRefresher,
    notifier: Notifier,
    events: broadcast::Sender<SessionEvent>,
}

impl CatalogService {
    pub fn new(
        config: Config,
        dispatcher: Dispatcher,
        store: CredentialStore,
        refresher: TokenRefresher,
        notifier: Notifier,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            store,
            refresher,
            notifier,
            events,
        }
    }

    // ─── Session ─────────────────────────────────────────────────────────────

    /// Log in and store the returned credentials and identity together.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let result: Result<LoginResponse> = async {
            let spec =
                RequestSpec::post(self.config.login_url()).json(&LoginRequest { username, password })?;
            let response = self.dispatcher.send_public(spec).await?;
            json_body(response).await
        }
        .await;
        let body = self.report(result)?;

        self.store.set(
            CredentialPair::new(body.access_token, body.refresh_token),
            body.user.clone(),
        );
        self.refresher.forget();
        let _ = self.events.send(SessionEvent::LoggedIn(body.user.clone()));

        tracing::info!(username = %body.user.username, "Logged in");
        self.notifier.success("Login successful");
        Ok(body.user)
    }

    /// Register a new account. Success is decided by this call's own response.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let result: Result<()> = async {
            let spec = RequestSpec::post(self.config.register_url()).json(&RegisterRequest {
                username,
                email,
                password,
            })?;
            let response = self.dispatcher.send_public(spec).await?;
            expect_success(response).await.map(|_| ())
        }
        .await;
        self.report(result)?;

        tracing::info!(username, "Registered");
        self.notifier.success("Registration successful. Please log in.");
        Ok(())
    }

    /// End the session locally. Idempotent.
    pub fn logout(&self) {
        let was_logged_in = self.store.is_logged_in();
        self.store.clear();
        self.refresher.forget();
        let _ = self.events.send(SessionEvent::LoggedOut);

        if was_logged_in {
            tracing::info!("Logged out");
        }
        self.notifier.info("Logged out");
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.is_logged_in()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.store.identity()
    }

    // ─── Products ────────────────────────────────────────────────────────────

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let result: Result<Vec<Product>> = async {
            let response = self
                .dispatcher
                .send(RequestSpec::get(self.config.products_url()))
                .await?;
            json_body(response).await
        }
        .await;
        self.report(result)
    }

    pub async fn get_product(&self, id: u64) -> Result<Product> {
        let result: Result<Product> = async {
            let response = self
                .dispatcher
                .send(RequestSpec::get(self.config.product_url(id)))
                .await?;
            json_body(response).await
        }
        .await;
        self.report(result)
    }

    /// Create a product and return its id.
    pub async fn create_product(&self, input: &ProductInput) -> Result<u64> {
        let result: Result<u64> = async {
            validate_input(input)?;
            let spec = RequestSpec::post(self.config.products_url()).json(input)?;
            let response = self.dispatcher.send(spec).await?;
            let ack: ApiMessage = json_body(response).await?;
            ack.id.ok_or_else(|| {
                ClientError::Decode("Create response did not include a product id".to_string())
            })
        }
        .await;
        self.report(result)
    }

    pub async fn update_product(&self, id: u64, input: &ProductInput) -> Result<()> {
        let result: Result<()> = async {
            validate_input(input)?;
            let spec = RequestSpec::put(self.config.product_url(id)).json(input)?;
            let response = self.dispatcher.send(spec).await?;
            expect_success(response).await.map(|_| ())
        }
        .await;
        self.report(result)
    }

    pub async fn delete_product(&self, id: u64) -> Result<()> {
        let result: Result<()> = async {
            let response = self
                .dispatcher
                .send(RequestSpec::delete(self.config.product_url(id)))
                .await?;
            expect_success(response).await.map(|_| ())
        }
        .await;
        self.report(result)?;

        tracing::info!(product_id = id, "Product deleted");
        self.notifier.success("Product deleted successfully");
        Ok(())
    }

    /// Save a product form: upload the staged image (if any), then create
    /// or update. Returns the product id.
    ///
    /// The staged image is discarded whether or not the save succeeds.
    pub async fn save_product(
        &self,
        draft: &ProductDraft,
        upload: &mut UploadPipeline,
    ) -> Result<u64> {
        // Reject a bad form before spending an upload on it
        if let Err(e) = validate_input(&draft.to_input(draft.product_image_url.clone())) {
            upload.clear_selection();
            return self.report(Err(e));
        }

        // The pipeline reports its own failures
        let image_url = upload
            .upload(draft.product_image_url.as_deref())
            .await?;
        let input = draft.to_input(image_url);

        match draft.id {
            Some(id) => {
                self.update_product(id, &input).await?;
                tracing::info!(product_id = id, "Product updated");
                self.notifier.success("Product updated successfully");
                Ok(id)
            }
            None => {
                let id = self.create_product(&input).await?;
                tracing::info!(product_id = id, "Product created");
                self.notifier.success("Product created successfully");
                Ok(id)
            }
        }
    }

    /// Surface a failure on the notification channel and hand it back.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_session_ended() {
                self.notifier.error(e.user_message());
            }
        }
        result
    }
}

fn validate_input(input: &ProductInput) -> Result<()> {
    input.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join("; ");
        ClientError::Validation(if message.is_empty() {
            errors.to_string()
        } else {
            message
        })
    })
}
