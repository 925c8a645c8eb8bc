//! Named collection of configured shutters
//!
//! Front-ends look shutters up by name and enumerate them; the daemon uses
//! the directory to start and stop every poller at once.

use std::sync::Arc;
use tracing::info;

use crate::config::ShutterConfig;
use crate::error::{Error, Result};
use crate::registry::DriverRegistry;
use crate::shutter::{RollerShutter, ShutterGroup};
use crate::traits::Shutter;

/// Ordered set of shutters with unique names
#[derive(Default)]
pub struct ShutterDirectory {
    shutters: Vec<Arc<dyn Shutter>>,
}

impl ShutterDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the shutters described by `config`
    ///
    /// With one device the shutter takes the installation name. With several
    /// devices each one is named `{name}_{device}` and a group named
    /// `{name}_all` covering all of them is listed first.
    pub fn from_config(config: &ShutterConfig, registry: &DriverRegistry) -> Result<Self> {
        config.validate()?;

        if registry.is_empty() {
            return Err(Error::config("No drivers registered"));
        }

        let candidates = registry.candidates();
        let build = |name: String, address: &str| -> Arc<dyn Shutter> {
            Arc::new(
                RollerShutter::builder(name, address, candidates.clone())
                    .reverse_directions(config.reverse_directions)
                    .poll_config(config.poll.clone())
                    .build(),
            )
        };

        let mut directory = Self::new();

        if let [device] = config.devices.as_slice() {
            directory.insert(build(config.name.clone(), device.normalized_address()))?;
        } else {
            let members: Vec<Arc<dyn Shutter>> = config
                .devices
                .iter()
                .map(|device| {
                    build(
                        format!("{}_{}", config.name, device.name),
                        device.normalized_address(),
                    )
                })
                .collect();

            let group = ShutterGroup::new(format!("{}_all", config.name), members.clone());
            directory.insert(Arc::new(group))?;
            for member in members {
                directory.insert(member)?;
            }
        }

        info!(
            "Configured {} shutter(s): {}",
            directory.len(),
            directory.names().join(", ")
        );
        Ok(directory)
    }

    /// Add a shutter, rejecting duplicate names
    pub fn insert(&mut self, shutter: Arc<dyn Shutter>) -> Result<()> {
        if self.get(shutter.name()).is_some() {
            return Err(Error::config(format!(
                "Duplicate shutter name: {}",
                shutter.name()
            )));
        }
        self.shutters.push(shutter);
        Ok(())
    }

    /// Look up a shutter by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Shutter>> {
        self.shutters
            .iter()
            .find(|shutter| shutter.name() == name)
            .cloned()
    }

    /// All shutter names, in order
    pub fn names(&self) -> Vec<String> {
        self.shutters.iter().map(|s| s.name().to_string()).collect()
    }

    /// Iterate over all shutters, in order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Shutter>> {
        self.shutters.iter()
    }

    /// Number of shutters
    pub fn len(&self) -> usize {
        self.shutters.len()
    }

    /// Check if the directory is empty
    pub fn is_empty(&self) -> bool {
        self.shutters.is_empty()
    }

    /// Start background synchronization of every shutter
    pub fn start_all(&self) {
        for shutter in &self.shutters {
            shutter.start();
        }
    }

    /// Stop background synchronization of every shutter
    pub fn stop_all(&self) {
        for shutter in &self.shutters {
            shutter.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DriverFactory, RollerDriver};

    struct NoDriverFactory;

    impl DriverFactory for NoDriverFactory {
        fn create(&self, address: &str) -> Result<Box<dyn RollerDriver>> {
            Err(Error::transport(address, "not available in tests"))
        }

        fn driver_name(&self) -> &'static str {
            "none"
        }
    }

    fn registry() -> DriverRegistry {
        let registry = DriverRegistry::new();
        registry.register_driver("none", Box::new(NoDriverFactory));
        registry
    }

    #[test]
    fn single_device_takes_installation_name() {
        let config = ShutterConfig::new("kitchen").with_device("main", "http://10.0.0.5/");
        let directory = ShutterDirectory::from_config(&config, &registry()).unwrap();

        assert_eq!(directory.names(), vec!["kitchen".to_string()]);
        assert!(directory.get("kitchen").is_some());
    }

    #[test]
    fn several_devices_get_a_leading_group() {
        let config = ShutterConfig::new("living")
            .with_device("left", "http://10.0.0.5")
            .with_device("right", "http://10.0.0.6");
        let directory = ShutterDirectory::from_config(&config, &registry()).unwrap();

        assert_eq!(
            directory.names(),
            vec![
                "living_all".to_string(),
                "living_left".to_string(),
                "living_right".to_string()
            ]
        );
    }

    #[test]
    fn requires_registered_drivers() {
        let config = ShutterConfig::new("kitchen").with_device("main", "http://h");
        assert!(ShutterDirectory::from_config(&config, &DriverRegistry::new()).is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut directory = ShutterDirectory::new();
        directory
            .insert(Arc::new(RollerShutter::new("a", "http://h1", Vec::new())))
            .unwrap();
        let duplicate = directory.insert(Arc::new(RollerShutter::new("a", "http://h2", Vec::new())));

        assert!(duplicate.is_err());
        assert_eq!(directory.len(), 1);
    }
}
