// # shutter-core
//
// Core library for keeping a live, synchronized view of motorized
// roller shutters and commanding new positions.
//
// ## Architecture Overview
//
// - **RollerDriver**: Trait for one device protocol variant (read / command)
// - **DriverRegistry**: Ordered plugin registry of driver factories
// - **detect::auto_select**: Probes candidates until one answers
// - **Shutter**: Capability shared by single devices and groups
// - **RollerShutter**: One device with a cached position and background poller
// - **ShutterGroup**: Several shutters presented as one (mean position, fan-out)
// - **ShutterDirectory**: Named shutters built from configuration
//
// ## Design Principles
//
// 1. **Cached reads**: `position()` never blocks on the network
// 2. **Lazy recovery**: A failed call drops the driver binding; the next call re-detects
// 3. **Plugin-based**: Protocol variants live in driver crates, not in the core
// 4. **Library-first**: Front-ends only use `position` / `set_position` / `add_listener`

pub mod config;
pub mod detect;
pub mod directory;
pub mod error;
pub mod position;
pub mod registry;
pub mod shutter;
pub mod stream;
pub mod traits;

// Re-export core types for convenience
pub use config::{DeviceConfig, PollConfig, ShutterConfig, TransportConfig};
pub use detect::{Detection, auto_select};
pub use directory::ShutterDirectory;
pub use error::{Error, Result};
pub use position::Position;
pub use registry::DriverRegistry;
pub use shutter::{ListenerSet, RollerShutter, RollerShutterBuilder, ShutterGroup};
pub use stream::{PositionChanges, position_changes};
pub use traits::{DriverFactory, Listener, RollerDriver, Shutter};
