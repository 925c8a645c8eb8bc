//! Shutter implementations
//!
//! - [`RollerShutter`]: one physical device with background polling
//! - [`ShutterGroup`]: several shutters presented as one
//! - [`ListenerSet`]: change callbacks shared by both

pub mod group;
pub mod listeners;
pub mod single;

pub use group::ShutterGroup;
pub use listeners::ListenerSet;
pub use single::{RollerShutter, RollerShutterBuilder};
