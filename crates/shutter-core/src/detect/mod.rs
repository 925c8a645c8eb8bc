//! Device autodetection
//!
//! Given an address, tries each candidate driver in priority order with one
//! trial read. The first candidate that answers becomes the bound driver.
//!
//! ```text
//! address ──► [gen1] ─fail─► [gen2] ─fail─► Detection::Failed
//!                │              │
//!                ok             ok
//!                ▼              ▼
//!         Detection::Bound  Detection::Bound
//! ```
//!
//! Failure is not cached: the caller simply runs detection again on its next
//! access, since the device may only be temporarily unreachable.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::traits::{DriverFactory, RollerDriver};

/// Outcome of probing one address
pub enum Detection {
    /// A candidate answered its trial read
    Bound(Box<dyn RollerDriver>),

    /// No candidate accepted the device
    Failed {
        /// Probed address
        address: String,
        /// Per-candidate failure messages, in probe order
        attempts: Vec<(&'static str, String)>,
    },
}

impl Detection {
    /// Check if a driver was bound
    pub fn is_bound(&self) -> bool {
        matches!(self, Detection::Bound(_))
    }

    /// Convert into the bound driver, mapping failure into `DetectionFailed`
    pub fn into_driver(self) -> Result<Box<dyn RollerDriver>, crate::Error> {
        match self {
            Detection::Bound(driver) => Ok(driver),
            Detection::Failed { address, .. } => Err(crate::Error::detection_failed(address)),
        }
    }
}

impl std::fmt::Debug for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detection::Bound(driver) => f
                .debug_struct("Bound")
                .field("driver", &driver.driver_name())
                .field("address", &driver.address())
                .finish(),
            Detection::Failed { address, attempts } => f
                .debug_struct("Failed")
                .field("address", address)
                .field("attempts", attempts)
                .finish(),
        }
    }
}

/// Probe `address` with each candidate in order, short-circuiting on success
pub async fn auto_select(address: &str, candidates: &[Arc<dyn DriverFactory>]) -> Detection {
    let mut attempts = Vec::with_capacity(candidates.len());

    for factory in candidates {
        let driver = match factory.create(address) {
            Ok(driver) => driver,
            Err(e) => {
                debug!("Driver {} rejected {}: {}", factory.driver_name(), address, e);
                attempts.push((factory.driver_name(), e.to_string()));
                continue;
            }
        };

        match driver.read_position().await {
            Ok(position) => {
                info!(
                    "Detected {} running on {} (position {})",
                    driver.driver_name(),
                    address,
                    position
                );
                return Detection::Bound(driver);
            }
            Err(e) => {
                debug!("Trial read with {} on {} failed: {}", factory.driver_name(), address, e);
                attempts.push((factory.driver_name(), e.to_string()));
            }
        }
    }

    warn!("Unsupported or unreachable device on {}", address);
    Detection::Failed {
        address: address.to_string(),
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ProbeDriver {
        name: &'static str,
        address: String,
        answers: bool,
    }

    #[async_trait]
    impl RollerDriver for ProbeDriver {
        async fn read_position(&self) -> crate::Result<Position> {
            if self.answers {
                Ok(Position::clamped(30))
            } else {
                Err(crate::Error::transport(&self.address, "404 Not Found"))
            }
        }

        async fn command_position(&self, target: Position) -> crate::Result<Position> {
            Ok(target)
        }

        fn address(&self) -> &str {
            &self.address
        }

        fn driver_name(&self) -> &'static str {
            self.name
        }
    }

    struct ProbeFactory {
        name: &'static str,
        answers: bool,
        created: Arc<AtomicUsize>,
    }

    impl ProbeFactory {
        fn new(name: &'static str, answers: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                answers,
                created: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    impl DriverFactory for ProbeFactory {
        fn create(&self, address: &str) -> crate::Result<Box<dyn RollerDriver>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ProbeDriver {
                name: self.name,
                address: address.to_string(),
                answers: self.answers,
            }))
        }

        fn driver_name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn first_answering_candidate_wins() {
        let first = ProbeFactory::new("first", false);
        let second = ProbeFactory::new("second", true);
        let third = ProbeFactory::new("third", true);
        let candidates: Vec<Arc<dyn DriverFactory>> =
            vec![first.clone(), second.clone(), third.clone()];

        let detection = auto_select("http://h", &candidates).await;

        let driver = detection.into_driver().unwrap();
        assert_eq!(driver.driver_name(), "second");
        assert_eq!(driver.address(), "http://h");
        assert_eq!(third.created.load(Ordering::SeqCst), 0, "probing stops at first success");
    }

    #[tokio::test]
    async fn no_answer_reports_every_attempt() {
        let candidates: Vec<Arc<dyn DriverFactory>> = vec![
            ProbeFactory::new("first", false),
            ProbeFactory::new("second", false),
        ];

        let detection = auto_select("http://h", &candidates).await;
        assert!(!detection.is_bound());

        match detection {
            Detection::Failed { address, attempts } => {
                assert_eq!(address, "http://h");
                let names: Vec<_> = attempts.iter().map(|(name, _)| *name).collect();
                assert_eq!(names, vec!["first", "second"]);
            }
            Detection::Bound(_) => panic!("expected detection failure"),
        }
    }

    #[test]
    fn empty_candidate_list_fails() {
        let detection = tokio_test::block_on(auto_select("http://h", &[]));
        assert!(matches!(
            detection.into_driver(),
            Err(crate::Error::DetectionFailed { .. })
        ));
    }
}
