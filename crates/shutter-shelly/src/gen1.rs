//! Shelly Gen1 roller API (Shelly 2.5 and compatible)
//!
//! - Read: `GET {address}/roller/0` → `{"current_pos": 30, ...}`
//! - Command: `GET {address}/roller/0?go=to_pos&roller_pos=30`

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shutter_core::{DriverFactory, Position, Result, RollerDriver};

use crate::transport::Transport;

pub(crate) const DRIVER_NAME: &str = "shelly_gen1";

const STATUS_PATH: &str = "/roller/0";

#[derive(Debug, Deserialize)]
struct RollerStatus {
    current_pos: Position,
}

/// Gen1 roller driver
pub struct ShellyGen1 {
    transport: Transport,
}

impl ShellyGen1 {
    /// Create a driver for `address`
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport: Transport::new(address, timeout),
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

fn command_path(target: Position) -> String {
    format!("{}?go=to_pos&roller_pos={}", STATUS_PATH, target)
}

#[async_trait]
impl RollerDriver for ShellyGen1 {
    async fn read_position(&self) -> Result<Position> {
        let status: RollerStatus = self.transport.get_json(STATUS_PATH).await?;
        Ok(status.current_pos)
    }

    async fn command_position(&self, target: Position) -> Result<Position> {
        self.transport.get(&command_path(target)).await?;
        Ok(target)
    }

    fn address(&self) -> &str {
        self.transport.address()
    }

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }
}

/// Factory for Gen1 drivers
pub struct ShellyGen1Factory {
    timeout: Duration,
}

impl ShellyGen1Factory {
    /// Create a factory whose drivers use `timeout` per request
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DriverFactory for ShellyGen1Factory {
    fn create(&self, address: &str) -> Result<Box<dyn RollerDriver>> {
        Ok(Box::new(ShellyGen1::new(address, self.timeout)))
    }

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }
}
