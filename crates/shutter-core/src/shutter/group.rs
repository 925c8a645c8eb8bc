//! Group of shutters presented as one
//!
//! A group owns no device state. Its position is derived from its members,
//! commands fan out to every member, and any member notification is
//! re-published as the group's own. Groups run no poll task.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::error::{Error, Result};
use crate::position::Position;
use crate::shutter::ListenerSet;
use crate::traits::{Listener, Shutter};

/// Composition of shutters with averaged position and fan-out commands
pub struct ShutterGroup {
    name: String,
    members: Vec<Arc<dyn Shutter>>,
    listeners: Arc<ListenerSet>,
}

impl ShutterGroup {
    /// Create a group and subscribe it to every member
    ///
    /// The member list is fixed for the lifetime of the group.
    pub fn new(name: impl Into<String>, members: Vec<Arc<dyn Shutter>>) -> Self {
        let listeners = Arc::new(ListenerSet::new());

        // One relay shared by all members, so each member registers it once
        let relay: Listener = {
            let listeners = Arc::clone(&listeners);
            Arc::new(move || listeners.notify())
        };
        for member in &members {
            member.add_listener(Arc::clone(&relay));
        }

        Self {
            name: name.into(),
            members,
            listeners,
        }
    }

    /// Number of listeners registered on the group itself
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Members in construction order
    pub fn members(&self) -> &[Arc<dyn Shutter>] {
        &self.members
    }

    /// Read every member, isolating failures
    ///
    /// Returns the successfully read positions and one `GroupMember` error
    /// per member that could not be read.
    pub fn member_positions(&self) -> (Vec<Position>, Vec<Error>) {
        let mut positions = Vec::with_capacity(self.members.len());
        let mut failures = Vec::new();

        for member in &self.members {
            match member.position() {
                Ok(position) => positions.push(position),
                Err(e) => {
                    let failure = Error::group_member(member.name(), e.to_string());
                    error!("Error getting position for {}: {}", member.name(), e);
                    failures.push(failure);
                }
            }
        }

        (positions, failures)
    }

    /// Forward `target` to every member in turn
    ///
    /// A failing member does not stop the remaining ones. Returns one
    /// `GroupMember` error per failed member; an empty list means every
    /// member accepted the command.
    pub async fn fan_out(&self, target: Position) -> Vec<Error> {
        let mut failures = Vec::new();

        for member in &self.members {
            if let Err(e) = member.set_position(target).await {
                error!("Error setting position for {}: {}", member.name(), e);
                failures.push(Error::group_member(member.name(), e.to_string()));
            }
        }

        failures
    }
}

#[async_trait]
impl Shutter for ShutterGroup {
    fn name(&self) -> &str {
        &self.name
    }

    /// Floor of the mean of all readable member positions
    ///
    /// Unreadable members are left out of the denominator. With no readable
    /// member, or an all-zero sum, the group reports fully open.
    fn position(&self) -> Result<Position> {
        let (positions, _) = self.member_positions();
        Ok(Position::mean(&positions))
    }

    /// Partial application is accepted: member failures are logged only
    async fn set_position(&self, target: Position) -> Result<()> {
        self.fan_out(target).await;
        Ok(())
    }

    fn add_listener(&self, listener: Listener) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Listener) -> bool {
        self.listeners.remove(listener)
    }
}

impl std::fmt::Debug for ShutterGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: Vec<&str> = self.members.iter().map(|m| m.name()).collect();
        f.debug_struct("ShutterGroup")
            .field("name", &self.name)
            .field("members", &members)
            .finish()
    }
}
