// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-visible status notification.

use serde::Serialize;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// The single active notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Instance key; the auto-hide timer only hides the instance it was armed for.
    pub id: u64,
    pub message: String,
    pub severity: Severity,
}
