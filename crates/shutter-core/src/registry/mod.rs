//! Plugin-based driver registry
//!
//! The registry lets driver crates install their protocol variants at
//! runtime, avoiding a hardcoded list of devices in the core.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shutter_core::registry::DriverRegistry;
//!
//! let registry = DriverRegistry::new();
//!
//! // Drivers register in detection priority order
//! shutter_shelly::register(&registry, &TransportConfig::default());
//!
//! // Autodetect probes candidates in that same order
//! let detection = shutter_core::detect::auto_select(address, &registry.candidates()).await;
//! ```
//!
//! ## Ordering
//!
//! Unlike a name lookup table, registration order matters here: it is the
//! order in which autodetection tries the candidates.

use std::sync::{Arc, PoisonError, RwLock};

use crate::traits::DriverFactory;

/// Ordered registry of driver factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct DriverRegistry {
    /// Registered factories, in detection priority
    drivers: RwLock<Vec<(String, Arc<dyn DriverFactory>)>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver factory
    ///
    /// New names are appended (lowest priority so far). Registering an
    /// existing name replaces the factory but keeps its priority slot.
    ///
    /// # Parameters
    ///
    /// - `name`: Driver variant name (e.g., "shelly_gen1")
    /// - `factory`: Factory object for creating driver instances
    pub fn register_driver(&self, name: impl Into<String>, factory: Box<dyn DriverFactory>) {
        let name = name.into();
        let factory: Arc<dyn DriverFactory> = Arc::from(factory);
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);

        match drivers.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = factory,
            None => drivers.push((name, factory)),
        }
    }

    /// Factories in detection priority order
    pub fn candidates(&self) -> Vec<Arc<dyn DriverFactory>> {
        let drivers = self.drivers.read().unwrap_or_else(PoisonError::into_inner);
        drivers.iter().map(|(_, factory)| Arc::clone(factory)).collect()
    }

    /// List all registered driver names, in priority order
    pub fn list_drivers(&self) -> Vec<String> {
        let drivers = self.drivers.read().unwrap_or_else(PoisonError::into_inner);
        drivers.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Check if a driver name is registered
    pub fn has_driver(&self, name: &str) -> bool {
        let drivers = self.drivers.read().unwrap_or_else(PoisonError::into_inner);
        drivers.iter().any(|(existing, _)| existing == name)
    }

    /// Check if no driver is registered
    pub fn is_empty(&self) -> bool {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::traits::RollerDriver;

    struct MockDriverFactory(&'static str);

    impl DriverFactory for MockDriverFactory {
        fn create(&self, _address: &str) -> Result<Box<dyn RollerDriver>> {
            Err(Error::Other("Mock driver not implemented".to_string()))
        }

        fn driver_name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = DriverRegistry::new();

        // Initially empty
        assert!(registry.is_empty());
        assert!(!registry.has_driver("mock"));

        // Register
        registry.register_driver("mock", Box::new(MockDriverFactory("mock")));

        // Now present
        assert!(registry.has_driver("mock"));
        assert_eq!(registry.list_drivers(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_registration_order_is_priority() {
        let registry = DriverRegistry::new();
        registry.register_driver("a", Box::new(MockDriverFactory("a")));
        registry.register_driver("b", Box::new(MockDriverFactory("b")));
        registry.register_driver("a", Box::new(MockDriverFactory("a2")));

        assert_eq!(registry.list_drivers(), vec!["a".to_string(), "b".to_string()]);

        let names: Vec<_> = registry
            .candidates()
            .iter()
            .map(|factory| factory.driver_name())
            .collect();
        assert_eq!(names, vec!["a2", "b"]);
    }
}
