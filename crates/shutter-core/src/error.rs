//! Error types for the shutter system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for shutter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the shutter system
#[derive(Error, Debug)]
pub enum Error {
    /// A single device call failed (network, timeout, HTTP status or parse)
    #[error("device error ({address}): {message}")]
    Transport {
        /// Device address the call was issued against
        address: String,
        /// Underlying cause
        message: String,
    },

    /// No candidate driver accepted the device
    #[error("no supported driver detected on {address}")]
    DetectionFailed {
        /// Device address that was probed
        address: String,
    },

    /// One member of a group failed during an aggregate operation
    #[error("group member {member} failed: {message}")]
    GroupMember {
        /// Member shutter name
        member: String,
        /// Underlying cause
        message: String,
    },

    /// Position outside of [0, 100]
    #[error("invalid position {0}, expected 0..=100")]
    InvalidPosition(u16),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error for a device address
    pub fn transport(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a detection failure for a device address
    pub fn detection_failed(address: impl Into<String>) -> Self {
        Self::DetectionFailed {
            address: address.into(),
        }
    }

    /// Create a group member error
    pub fn group_member(member: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GroupMember {
            member: member.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a later attempt against the same device may succeed.
    ///
    /// Devices are frequently just unreachable for a while, so both a failed
    /// call and a failed detection are treated as transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::DetectionFailed { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
