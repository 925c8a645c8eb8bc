//! Single physical shutter
//!
//! A `RollerShutter` owns everything the system knows about one device:
//!
//! - the last observed raw position (an in-memory cache, no history)
//! - the driver binding found by autodetection
//! - an optional direction reversal
//! - the background poller and the change listeners
//!
//! ## Poll cycle
//!
//! ```text
//! ┌──────────────┐  ok   ┌────────────────┐ changed ┌──────────────┐
//! │ read_position│──────►│ update cache   │────────►│ notify       │
//! └──────────────┘       └────────────────┘         └──────────────┘
//!        │ err                   │                        │
//!        ▼                       ▼                        ▼
//! ┌──────────────┐       sleep poll_interval ◄────────────┘
//! │ drop binding │
//! └──────────────┘──────► sleep failure_delay
//! ```
//!
//! Cycles are strictly sequential. `stop()` is observed between cycles, so
//! an in-flight device call always completes first. Once `stop()` returns no
//! poll notification is delivered any more.

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{PollConfig, normalize_address};
use crate::detect::{Detection, auto_select};
use crate::error::{Error, Result};
use crate::position::Position;
use crate::shutter::ListenerSet;
use crate::traits::{DriverFactory, Listener, RollerDriver, Shutter};

/// Shutter backed by one physical device
///
/// Dropping the shutter ends its poller after the current cycle.
pub struct RollerShutter {
    inner: Arc<Inner>,
    poller: Mutex<Option<Poller>>,
}

/// State shared between the shutter handle and its poll task
struct Inner {
    name: String,
    address: String,
    reverse_directions: bool,
    poll: PollConfig,

    /// Autodetect candidates, in priority order
    candidates: Vec<Arc<dyn DriverFactory>>,

    /// Raw device position (before reversal)
    raw_position: AtomicU8,

    /// Time of the last successful read or acknowledged command
    last_synced: Mutex<Option<DateTime<Utc>>>,

    /// Bound driver. The lock also serializes device access between the
    /// poll task and direct `set_position` callers.
    driver: tokio::sync::Mutex<Option<Box<dyn RollerDriver>>>,

    listeners: ListenerSet,

    /// Held by the poll task while it delivers a change notification
    notify_gate: Mutex<()>,
}

thread_local! {
    /// Set while a poll task runs listeners on this thread
    static NOTIFYING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as delivering poll notifications
struct NotifyScope;

impl NotifyScope {
    fn enter() -> Self {
        NOTIFYING.with(|flag| flag.set(true));
        NotifyScope
    }
}

impl Drop for NotifyScope {
    fn drop(&mut self) {
        NOTIFYING.with(|flag| flag.set(false));
    }
}

struct Poller {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Settings fixed for the lifetime of a [`RollerShutter`]
pub struct RollerShutterBuilder {
    name: String,
    address: String,
    candidates: Vec<Arc<dyn DriverFactory>>,
    reverse_directions: bool,
    poll: PollConfig,
}

impl RollerShutterBuilder {
    /// Invert the scale between logical and device positions
    pub fn reverse_directions(mut self, reverse: bool) -> Self {
        self.reverse_directions = reverse;
        self
    }

    /// Replace the polling settings
    pub fn poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn build(self) -> RollerShutter {
        RollerShutter {
            inner: Arc::new(Inner {
                name: self.name,
                address: self.address,
                reverse_directions: self.reverse_directions,
                poll: self.poll,
                candidates: self.candidates,
                raw_position: AtomicU8::new(Position::OPEN.value()),
                last_synced: Mutex::new(None),
                driver: tokio::sync::Mutex::new(None),
                listeners: ListenerSet::new(),
                notify_gate: Mutex::new(()),
            }),
            poller: Mutex::new(None),
        }
    }
}

impl RollerShutter {
    /// Create a shutter with default settings for the device at `address`
    ///
    /// No I/O happens here; the driver is detected on first use.
    ///
    /// # Parameters
    ///
    /// - `name`: Unique, user-facing name
    /// - `address`: Device base URI (trailing slash is stripped)
    /// - `candidates`: Driver factories to probe, in priority order
    pub fn new(
        name: impl Into<String>,
        address: impl AsRef<str>,
        candidates: Vec<Arc<dyn DriverFactory>>,
    ) -> Self {
        Self::builder(name, address, candidates).build()
    }

    /// Start configuring a shutter; see [`RollerShutter::new`] for parameters
    pub fn builder(
        name: impl Into<String>,
        address: impl AsRef<str>,
        candidates: Vec<Arc<dyn DriverFactory>>,
    ) -> RollerShutterBuilder {
        RollerShutterBuilder {
            name: name.into(),
            address: normalize_address(address.as_ref()).to_string(),
            candidates,
            reverse_directions: false,
            poll: PollConfig::default(),
        }
    }

    /// Device address
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Whether positions are reversed between device and caller
    pub fn reverse_directions(&self) -> bool {
        self.inner.reverse_directions
    }

    /// Polling settings
    pub fn poll_config(&self) -> &PollConfig {
        &self.inner.poll
    }

    /// Number of registered change listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Last cached position as the device reports it (no reversal)
    pub fn raw_position(&self) -> Position {
        self.inner.raw()
    }

    /// Time of the last successful device read or acknowledged command
    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .last_synced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Name of the currently bound driver, if detection has succeeded
    pub async fn driver_name(&self) -> Option<&'static str> {
        self.inner
            .driver
            .lock()
            .await
            .as_ref()
            .map(|driver| driver.driver_name())
    }

    /// Run one sync cycle now and return the logical position
    ///
    /// Listeners fire if the position changed.
    pub async fn refresh(&self) -> Result<Position> {
        if self.inner.sync().await? {
            self.inner.listeners.notify();
        }
        Ok(self.inner.logical())
    }

    /// Check if a poll task is active
    pub fn is_running(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|poller| !poller.handle.is_finished())
    }
}

impl Inner {
    fn raw(&self) -> Position {
        Position::clamped(self.raw_position.load(Ordering::SeqCst) as i64)
    }

    fn logical(&self) -> Position {
        self.raw().reversed_if(self.reverse_directions)
    }

    /// Store a raw position, returning whether it differs from the cache
    fn store(&self, raw: Position) -> bool {
        let previous = self.raw_position.swap(raw.value(), Ordering::SeqCst);
        let first = self
            .last_synced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Utc::now())
            .is_none();

        if first {
            info!(
                "First sync of {} with {} (position {})",
                self.name,
                self.address,
                raw.reversed_if(self.reverse_directions)
            );
        }
        previous != raw.value()
    }

    /// Bind a driver if none is bound yet
    async fn bind<'a>(
        &self,
        binding: &'a mut Option<Box<dyn RollerDriver>>,
    ) -> Result<&'a dyn RollerDriver> {
        if binding.is_none() {
            match auto_select(&self.address, &self.candidates).await {
                Detection::Bound(driver) => *binding = Some(driver),
                Detection::Failed { address, .. } => {
                    return Err(Error::detection_failed(address));
                }
            }
        }

        binding
            .as_deref()
            .ok_or_else(|| Error::detection_failed(&self.address))
    }

    /// Read the device, dropping the binding on failure
    async fn read_raw(&self) -> Result<Position> {
        let mut binding = self.driver.lock().await;
        let driver = self.bind(&mut binding).await?;

        let result = driver.read_position().await;
        match result {
            Ok(position) => Ok(position),
            Err(e) => {
                debug!("Dropping driver binding for {} after read failure", self.name);
                *binding = None;
                Err(e)
            }
        }
    }

    /// Command the device, dropping the binding on failure
    async fn command_raw(&self, target: Position) -> Result<Position> {
        let mut binding = self.driver.lock().await;
        let driver = self.bind(&mut binding).await?;

        let result = driver.command_position(target).await;
        match result {
            Ok(acknowledged) => Ok(acknowledged),
            Err(e) => {
                debug!("Dropping driver binding for {} after command failure", self.name);
                *binding = None;
                Err(e)
            }
        }
    }

    /// One sync cycle; returns whether the cached position changed
    async fn sync(&self) -> Result<bool> {
        let raw = self.read_raw().await?;
        Ok(self.store(raw))
    }

    async fn set_position(&self, target: Position) -> Result<()> {
        info!("{} setting position={}", self.name, target);

        let raw_target = target.reversed_if(self.reverse_directions);
        let acknowledged = self.command_raw(raw_target).await.inspect_err(|e| {
            error!("{} could not move to {}: {}", self.name, target, e);
        })?;

        self.store(acknowledged);
        self.listeners.notify();
        Ok(())
    }
}

async fn poll_loop(inner: Arc<Inner>, mut stop_rx: watch::Receiver<bool>) {
    info!(
        "Starting sync of {} (address={}, interval={:?}, reverse_directions={})",
        inner.name,
        inner.address,
        inner.poll.poll_interval(),
        inner.reverse_directions
    );

    loop {
        if *stop_rx.borrow() {
            break;
        }

        let delay = match inner.sync().await {
            Ok(changed) => {
                if changed {
                    // stop() signals first, then waits for this gate
                    let _gate = inner.notify_gate.lock().unwrap_or_else(PoisonError::into_inner);
                    if !*stop_rx.borrow() {
                        debug!("{} position changed to {}", inner.name, inner.logical());
                        let _scope = NotifyScope::enter();
                        inner.listeners.notify();
                    }
                }
                inner.poll.poll_interval()
            }
            Err(e) => {
                warn!("Error occurred on sync of {}: {}", inner.name, e);
                inner.poll.failure_delay()
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = stop_rx.changed() => {
                // Sender dropped together with the shutter
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Sync of {} stopped", inner.name);
}

#[async_trait]
impl Shutter for RollerShutter {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn position(&self) -> Result<Position> {
        Ok(self.inner.logical())
    }

    async fn set_position(&self, target: Position) -> Result<()> {
        self.inner.set_position(target).await
    }

    fn add_listener(&self, listener: Listener) {
        self.inner.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Listener) -> bool {
        self.inner.listeners.remove(listener)
    }

    /// Spawn the poll task on the current tokio runtime
    ///
    /// Starting an already running shutter is ignored.
    fn start(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_some_and(|p| !p.handle.is_finished()) {
            warn!("{} is already running", self.inner.name);
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot start sync of {}: {}", self.inner.name, e);
                return;
            }
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(poll_loop(Arc::clone(&self.inner), stop_rx));
        *poller = Some(Poller { stop_tx, handle });
    }

    fn stop(&self) {
        let poller = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(poller) = poller {
            // Receiver may already be gone if the task ended
            let _ = poller.stop_tx.send(true);

            // Wait out a delivery in progress, unless called from one
            if !NOTIFYING.with(Cell::get) {
                drop(
                    self.inner
                        .notify_gate
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner),
                );
            }
        }
    }
}

impl std::fmt::Debug for RollerShutter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollerShutter")
            .field("name", &self.inner.name)
            .field("address", &self.inner.address)
            .field("reverse_directions", &self.inner.reverse_directions)
            .field("raw_position", &self.inner.raw())
            .finish()
    }
}
