// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the client.

pub mod credentials;
pub mod notification;
pub mod product;
pub mod session;
pub mod upload;

pub use credentials::{CredentialPair, Identity, LoginResponse, RefreshResponse, StoredSession};
pub use notification::{Notification, Severity};
pub use product::{ApiMessage, Product, ProductDraft, ProductInput};
pub use session::SessionEvent;
pub use upload::{PendingUpload, SelectedAsset, UploadState, UploadTarget};
