// # Shutter Trait
//
// The capability every front-end depends on. Implemented by a single device
// (`RollerShutter`) and by a composition of shutters (`ShutterGroup`).

use async_trait::async_trait;
use std::sync::Arc;

use crate::position::Position;

/// Zero-argument change callback
///
/// Listeners are compared by identity: registering the same `Arc` twice is a
/// no-op.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// A logical or physical unit whose position can be read and commanded
#[async_trait]
pub trait Shutter: Send + Sync {
    /// Stable, user-facing identifier
    fn name(&self) -> &str;

    /// Last known logical position
    ///
    /// Never performs I/O. A single device always answers from its cache;
    /// aggregate implementations may fail when nothing can be read.
    fn position(&self) -> Result<Position, crate::Error>;

    /// Command a new logical position
    async fn set_position(&self, target: Position) -> Result<(), crate::Error>;

    /// Register a callback fired after any position change
    fn add_listener(&self, listener: Listener);

    /// Unregister a callback by identity, returning whether it was present
    fn remove_listener(&self, listener: &Listener) -> bool;

    /// Begin background synchronization (no-op for pure compositions)
    fn start(&self) {}

    /// End background synchronization (no-op for pure compositions)
    fn stop(&self) {}
}
