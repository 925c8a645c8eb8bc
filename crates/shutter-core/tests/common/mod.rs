//! Test doubles and common utilities for shutter contract tests
//!
//! This module provides scripted devices that stand in for real hardware,
//! so the contracts can be checked without any network I/O.

#![allow(dead_code)]

use async_trait::async_trait;
use shutter_core::config::PollConfig;
use shutter_core::error::{Error, Result};
use shutter_core::traits::{DriverFactory, Listener, RollerDriver, Shutter};
use shutter_core::{ListenerSet, Position, RollerShutter};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Poll settings short enough for tests
pub fn fast_poll() -> PollConfig {
    PollConfig {
        poll_interval_ms: 20,
        failure_delay_ms: 20,
    }
}

/// Enough time for several poll cycles with [`fast_poll`]
pub const SETTLE: Duration = Duration::from_millis(150);

pub fn pos(value: u8) -> Position {
    Position::new(value).expect("test position in range")
}

/// Shared state of a simulated device
#[derive(Default)]
struct DeviceState {
    position: AtomicU8,
    failing: AtomicBool,
    reads: AtomicUsize,
    commands: Mutex<Vec<Position>>,
}

/// Handle a test uses to steer a simulated device
#[derive(Clone, Default)]
pub struct FakeDevice {
    state: Arc<DeviceState>,
}

impl FakeDevice {
    pub fn new(raw_position: u8) -> Self {
        let device = Self::default();
        device.set_position(raw_position);
        device
    }

    /// Change what the device reports on the next read
    pub fn set_position(&self, raw_position: u8) {
        self.state.position.store(raw_position, Ordering::SeqCst);
    }

    /// Make every call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful reads served
    pub fn read_count(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }

    /// Raw targets received, in order
    pub fn commands(&self) -> Vec<Position> {
        self.state.commands.lock().unwrap().clone()
    }
}

/// Driver bound to a [`FakeDevice`]
pub struct FakeDriver {
    name: &'static str,
    address: String,
    device: FakeDevice,
}

#[async_trait]
impl RollerDriver for FakeDriver {
    async fn read_position(&self) -> Result<Position> {
        let state = &self.device.state;
        if state.failing.load(Ordering::SeqCst) {
            return Err(Error::transport(&self.address, "connection reset"));
        }
        state.reads.fetch_add(1, Ordering::SeqCst);
        Ok(pos(state.position.load(Ordering::SeqCst)))
    }

    async fn command_position(&self, target: Position) -> Result<Position> {
        let state = &self.device.state;
        if state.failing.load(Ordering::SeqCst) {
            return Err(Error::transport(&self.address, "connection reset"));
        }
        state.commands.lock().unwrap().push(target);
        state.position.store(target.value(), Ordering::SeqCst);
        Ok(target)
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn driver_name(&self) -> &'static str {
        self.name
    }
}

/// Factory producing [`FakeDriver`]s and counting detections
pub struct FakeFactory {
    name: &'static str,
    device: FakeDevice,
    created: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(name: &'static str, device: &FakeDevice) -> Self {
        Self {
            name,
            device: device.clone(),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of drivers created (one per detection attempt)
    pub fn created_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.created)
    }
}

impl DriverFactory for FakeFactory {
    fn create(&self, address: &str) -> Result<Box<dyn RollerDriver>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDriver {
            name: self.name,
            address: address.to_string(),
            device: self.device.clone(),
        }))
    }

    fn driver_name(&self) -> &'static str {
        self.name
    }
}

/// Shutter over `device` with fast polling; returns the detection counter too
pub fn fake_shutter(name: &str, device: &FakeDevice, reverse: bool) -> (RollerShutter, Arc<AtomicUsize>) {
    let factory = FakeFactory::new("fake", device);
    let created = factory.created_counter();
    let candidates: Vec<Arc<dyn DriverFactory>> = vec![Arc::new(factory)];

    let shutter = RollerShutter::builder(name, format!("http://{name}.local"), candidates)
        .reverse_directions(reverse)
        .poll_config(fast_poll())
        .build();

    (shutter, created)
}

/// Listener that counts its invocations
pub fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let listener: Listener = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (listener, count)
}

/// Group member with a fixed position that can be told to fail
pub struct StubShutter {
    name: String,
    position: Option<Position>,
    fail_commands: bool,
    commanded: Mutex<Vec<Position>>,
    listeners: ListenerSet,
}

impl StubShutter {
    /// Number of registered change listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn reading(name: &str, value: u8) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            position: Some(pos(value)),
            fail_commands: false,
            commanded: Mutex::new(Vec::new()),
            listeners: ListenerSet::new(),
        })
    }

    pub fn broken(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            position: None,
            fail_commands: true,
            commanded: Mutex::new(Vec::new()),
            listeners: ListenerSet::new(),
        })
    }

    pub fn commanded(&self) -> Vec<Position> {
        self.commanded.lock().unwrap().clone()
    }

    /// Simulate a change notification from this member
    pub fn fire(&self) {
        self.listeners.notify();
    }
}

#[async_trait]
impl Shutter for StubShutter {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<Position> {
        self.position
            .ok_or_else(|| Error::transport("http://stub", "no position available"))
    }

    async fn set_position(&self, target: Position) -> Result<()> {
        self.commanded.lock().unwrap().push(target);
        if self.fail_commands {
            return Err(Error::transport("http://stub", "command rejected"));
        }
        Ok(())
    }

    fn add_listener(&self, listener: Listener) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Listener) -> bool {
        self.listeners.remove(listener)
    }
}
