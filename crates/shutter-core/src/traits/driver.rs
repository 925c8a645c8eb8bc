// # Roller Driver Trait
//
// Defines the interface for talking to one physical roller-shutter device.
//
// ## Implementations
//
// - Shelly Gen1 / Gen2 protocol variants: `shutter-shelly` crate
//
// ## Usage
//
// ```rust,ignore
// use shutter_core::{Position, RollerDriver};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let driver = /* RollerDriver implementation */;
//
//     let current = driver.read_position().await?;
//     driver.command_position(Position::new(40)?).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::position::Position;

/// Trait for device driver implementations
///
/// A driver is one protocol variant bound to one device address. Positions
/// crossing this trait are raw device values: reversal is applied by the
/// owning shutter, never here.
///
/// # Failure contract
///
/// - Any failed call must leave the driver ready for a fresh connection on
///   the next call (no reuse of a broken session).
/// - Drivers do not retry. A failed call is reported once and the owning
///   shutter decides whether to re-detect.
/// - Drivers do not spawn tasks; polling belongs to the shutter.
#[async_trait]
pub trait RollerDriver: Send + Sync {
    /// Read the device's current position
    ///
    /// # Returns
    ///
    /// - `Ok(Position)`: The position reported by the device
    /// - `Err(Error::Transport)`: Network, status or parse failure
    async fn read_position(&self) -> Result<Position, crate::Error>;

    /// Command the device to move to `target`
    ///
    /// The device reaches the target asynchronously, so a successful call
    /// returns the target unchanged as its acknowledgement.
    async fn command_position(&self, target: Position) -> Result<Position, crate::Error>;

    /// Address this driver is bound to
    fn address(&self) -> &str;

    /// Driver variant name (for logging/debugging)
    fn driver_name(&self) -> &'static str;
}

/// Helper trait for constructing drivers during autodetection
pub trait DriverFactory: Send + Sync {
    /// Create a driver bound to `address`
    ///
    /// Construction must not perform I/O; detection issues the trial read.
    fn create(&self, address: &str) -> Result<Box<dyn RollerDriver>, crate::Error>;

    /// Driver variant name produced by this factory
    fn driver_name(&self) -> &'static str;
}
