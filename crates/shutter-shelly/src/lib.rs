// # Shelly roller drivers
//
// This crate provides the Shelly protocol variants for the shutter system.
//
// ## Variants (detection priority)
//
// 1. `shelly_gen1`: Shelly 2.5 roller API (`/roller/0`)
// 2. `shelly_gen2`: Plus/Pro cover RPC API (`/rpc/Cover.*`)
//
// ## Architecture
//
// Each driver owns one [`Transport`]: a lazily created HTTP session that is
// discarded after any failed call. Drivers neither retry nor poll; the owning
// `RollerShutter` handles re-detection and scheduling.

pub mod gen1;
pub mod gen2;
pub mod transport;

use shutter_core::{DriverRegistry, TransportConfig};

pub use gen1::{ShellyGen1, ShellyGen1Factory};
pub use gen2::{ShellyGen2, ShellyGen2Factory};
pub use transport::Transport;

/// Register the Shelly drivers with a registry, in detection priority
pub fn register(registry: &DriverRegistry, config: &TransportConfig) {
    let timeout = config.request_timeout();
    registry.register_driver(gen1::DRIVER_NAME, Box::new(ShellyGen1Factory::new(timeout)));
    registry.register_driver(gen2::DRIVER_NAME, Box::new(ShellyGen2Factory::new(timeout)));
}
