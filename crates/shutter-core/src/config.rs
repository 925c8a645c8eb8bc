//! Configuration types for the shutter system
//!
//! This module defines all configuration structures used throughout the crate.
//! Values are supplied by the bootstrap layer; the core never reads files or
//! environment variables itself.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Main shutter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutterConfig {
    /// Display name of the installation (prefix for per-device names)
    pub name: String,

    /// Physical devices, in presentation order
    pub devices: Vec<DeviceConfig>,

    /// Invert the 0..100 scale between logical and device positions
    #[serde(default)]
    pub reverse_directions: bool,

    /// Background polling settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Device transport settings
    #[serde(default)]
    pub transport: TransportConfig,
}

impl ShutterConfig {
    /// Create a configuration without devices
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: Vec::new(),
            reverse_directions: false,
            poll: PollConfig::default(),
            transport: TransportConfig::default(),
        }
    }

    /// Add a device
    pub fn with_device(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.devices.push(DeviceConfig::new(name, address));
        self
    }

    /// Enable or disable direction reversal
    pub fn with_reverse_directions(mut self, reverse: bool) -> Self {
        self.reverse_directions = reverse;
        self
    }

    /// Replace the polling settings
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Shutter name cannot be empty"));
        }

        if self.devices.is_empty() {
            return Err(crate::Error::config("No devices configured"));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            device.validate()?;
            if !seen.insert(device.name.as_str()) {
                return Err(crate::Error::config(format!(
                    "Duplicate device name: {}",
                    device.name
                )));
            }
        }

        self.poll.validate()?;
        self.transport.validate()?;

        Ok(())
    }
}

/// One physical device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name, unique within the installation
    pub name: String,

    /// Base URI of the device API (e.g., "http://192.168.1.40")
    pub address: String,
}

impl DeviceConfig {
    /// Create a new device configuration
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Address with any trailing slash removed
    pub fn normalized_address(&self) -> &str {
        normalize_address(&self.address)
    }

    /// Validate the device configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Device name cannot be empty"));
        }

        let address = self.normalized_address();
        if address.is_empty() {
            return Err(crate::Error::config(format!(
                "Device {} has an empty address",
                self.name
            )));
        }

        if !address.starts_with("http://") && !address.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Device {} address must use HTTP or HTTPS scheme. Got: {}",
                self.name, address
            )));
        }

        Ok(())
    }
}

/// Strip trailing slashes from a device base URI
pub fn normalize_address(address: &str) -> &str {
    address.trim().trim_end_matches('/')
}

/// Background polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay after a successful poll cycle (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay after a failed poll cycle (in milliseconds)
    ///
    /// Keeps an unreachable device from being hammered in a tight loop.
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,
}

impl PollConfig {
    /// Delay after a successful cycle
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay after a failed cycle
    pub fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.failure_delay_ms)
    }

    /// Validate the polling configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.failure_delay_ms == 0 {
            return Err(crate::Error::config("Failure delay must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            failure_delay_ms: default_failure_delay_ms(),
        }
    }
}

/// Device transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-request timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TransportConfig {
    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3030
}

fn default_failure_delay_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}
