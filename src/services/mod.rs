// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - client core.

pub mod catalog;
pub mod credentials;
pub mod dispatcher;
pub mod notifications;
pub mod refresh;
pub mod upload;

pub use catalog::CatalogService;
pub use credentials::{CredentialStore, FileStorage, MemoryStorage, SessionStorage};
pub use dispatcher::{Dispatcher, RequestSpec};
pub use notifications::Notifier;
pub use refresh::TokenRefresher;
pub use upload::UploadPipeline;
