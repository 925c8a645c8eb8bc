//! Core traits for the shutter system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RollerDriver`]: Read and command one physical device
//! - [`DriverFactory`]: Construct a driver bound to an address (autodetect candidate)
//! - [`Shutter`]: Capability shared by single devices and groups

pub mod driver;
pub mod shutter;

pub use driver::{DriverFactory, RollerDriver};
pub use shutter::{Listener, Shutter};
