// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-slot, auto-expiring notification channel.
//!
//! A new notification preempts the current one and cancels its timer. The
//! auto-hide timer is keyed to the notification id, so a late timer can never
//! hide a newer message.

use crate::models::{Notification, Severity};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a notification stays visible.
pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

struct NotifierInner {
    slot: watch::Sender<Option<Notification>>,
    /// Auto-hide task of the current notification
    timer: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
    duration: Duration,
}

impl NotifierInner {
    fn hide_if_current(&self, id: u64) {
        let _timer = self.timer.lock();
        self.slot.send_if_modified(|current| {
            if current.as_ref().map(|n| n.id) == Some(id) {
                *current = None;
                true
            } else {
                false
            }
        });
    }
}

/// Shared handle to the notification slot.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_duration(NOTIFICATION_DURATION)
    }

    pub fn with_duration(duration: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(NotifierInner {
                slot,
                timer: Mutex::new(None),
                next_id: AtomicU64::new(1),
                duration,
            }),
        }
    }

    /// Show `message`, replacing any current notification. Returns its id.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            message: message.into(),
            severity,
        };
        tracing::debug!(id, severity = ?severity, message = %notification.message, "Notification");

        let mut timer = self.inner.timer.lock();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        self.inner.slot.send_replace(Some(notification));
        *timer = self.arm_timer(id);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Info)
    }

    /// Hide the current notification early and cancel its timer.
    pub fn hide(&self) {
        let mut timer = self.inner.timer.lock();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        self.inner.slot.send_replace(None);
    }

    /// The visible notification, if any.
    pub fn current(&self) -> Option<Notification> {
        self.inner.slot.borrow().clone()
    }

    /// Watch the slot; the UI renders whatever the receiver holds.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.slot.subscribe()
    }

    fn arm_timer(&self, id: u64) -> Option<JoinHandle<()>> {
        // Without a runtime the notification stays until replaced or hidden
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let weak: Weak<NotifierInner> = Arc::downgrade(&self.inner);
        let duration = self.inner.duration;

        Some(handle.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.hide_if_current(id);
            }
        }))
    }
}
