// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error taxonomy.

use crate::config::ConfigError;

/// Error type returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh rejected with status {status}")]
    RefreshRejected { status: u16 },

    /// Network failure or timeout. Never triggers a refresh.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The refresh exchange itself failed on the network. The session stays.
    #[error("Token refresh unreachable: {0}")]
    RefreshUnavailable(String),

    /// Non-2xx business response, carrying the server's `msg` when present.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Upload target missing from server response")]
    NoUploadTarget,

    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Upload rejected with status {status}")]
    UploadRejected { status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// True for errors that end the current session.
    pub fn is_session_ended(&self) -> bool {
        matches!(
            self,
            ClientError::NoRefreshToken | ClientError::RefreshRejected { .. }
        )
    }

    /// HTTP status associated with the error, when one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RefreshRejected { status }
            | ClientError::Http { status, .. }
            | ClientError::UploadRejected { status } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for the notification channel.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NoRefreshToken | ClientError::RefreshRejected { .. } => {
                "Session expired. Please log in again.".to_string()
            }
            ClientError::Transport(e) if e.is_timeout() => {
                "The server took too long to respond.".to_string()
            }
            ClientError::Transport(_) | ClientError::RefreshUnavailable(_) => {
                "Could not reach the server.".to_string()
            }
            ClientError::Http { message, .. } => message.clone(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::NoUploadTarget => "Could not get an upload location.".to_string(),
            ClientError::PayloadTooLarge { max, .. } => {
                format!("Image is too large (max {}).", format_size(*max))
            }
            ClientError::UploadRejected { status } => {
                format!("Image upload failed (status {}).", status)
            }
            ClientError::Decode(_) => "Unexpected response from the server.".to_string(),
            ClientError::Storage(_) | ClientError::Config(_) => self.to_string(),
        }
    }
}

/// Human-readable size limit: MB from 1 MiB up, KB from 1 KiB up, else bytes.
pub fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_session_ended_matches() {
        assert!(ClientError::NoRefreshToken.is_session_ended());
        assert!(ClientError::RefreshRejected { status: 401 }.is_session_ended());
    }

    #[test]
    fn test_is_session_ended_no_match() {
        let err = ClientError::Http {
            status: 401,
            message: "Invalid username or password".to_string(),
        };
        assert!(!err.is_session_ended());
        assert!(!ClientError::NoUploadTarget.is_session_ended());
        assert!(!ClientError::UploadRejected { status: 403 }.is_session_ended());
    }

    #[test]
    fn test_status_and_message() {
        let err = ClientError::Http {
            status: 403,
            message: "Not authorized to delete this product".to_string(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.user_message(), "Not authorized to delete this product");

        let err = ClientError::PayloadTooLarge {
            size: 6 * 1024 * 1024,
            max: 5 * 1024 * 1024,
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.user_message(), "Image is too large (max 5 MB).");
    }

    #[test]
    fn test_small_limits_are_not_shown_as_zero_mb() {
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_size(64 * 1024), "64 KB");
        assert_eq!(format_size(512), "512 bytes");

        let err = ClientError::PayloadTooLarge {
            size: 70 * 1024,
            max: 64 * 1024,
        };
        assert_eq!(err.user_message(), "Image is too large (max 64 KB).");
    }

    #[test]
    fn test_refresh_unavailable_keeps_session() {
        let err = ClientError::RefreshUnavailable("connection refused".to_string());
        assert!(!err.is_session_ended());
        assert_eq!(err.user_message(), "Could not reach the server.");
    }
}
