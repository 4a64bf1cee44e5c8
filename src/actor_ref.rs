//! `ActorRef`: the only handle external code holds to an actor. Values, not
//! live connections — holding one does not imply the actor still exists.

use std::fmt;
use std::sync::Weak;

use crate::address::ActorPath;
use crate::error::AskError;
use crate::message::{Action, Payload};
use crate::system::{AskOutcome, SystemInner};

/// An immutable, cloneable handle to an actor by address. The backing
/// system is held weakly so a ref never keeps a system alive, and so
/// operations against a torn-down system resolve as lost destinations
/// rather than panicking.
#[derive(Clone)]
pub struct ActorRef {
    address: ActorPath,
    system: Weak<SystemInner>,
}

impl ActorRef {
    pub(crate) fn new(address: ActorPath, system: Weak<SystemInner>) -> Self {
        ActorRef { address, system }
    }

    pub fn address(&self) -> &ActorPath {
        &self.address
    }

    /// Fire-and-forget send, with no sender provenance attached. A no-op if
    /// the backing system or the target actor no longer exists.
    pub fn tell(&self, kind: impl Into<String>, payload: Payload) {
        self.tell_as(kind, payload, None)
    }

    /// Fire-and-forget send attributed to `sender`, so the target's handler
    /// can reply via the resolved `Enriched::sender`.
    pub fn tell_as(&self, kind: impl Into<String>, payload: Payload, sender: Option<&ActorRef>) {
        if let Some(system) = self.system.upgrade() {
            let from = sender.map(|s| s.address.clone());
            SystemInner::tell_from(&system, &self.address, Action::new(kind, payload), from);
        }
    }

    /// Request/response send, with no sender provenance attached. Resolves
    /// to `Cancelled` rather than erroring if the target does not exist.
    pub async fn ask(
        &self,
        kind: impl Into<String>,
        payload: Payload,
    ) -> Result<AskOutcome, AskError> {
        self.ask_as(kind, payload, None).await
    }

    /// Request/response send attributed to `sender`.
    pub async fn ask_as(
        &self,
        kind: impl Into<String>,
        payload: Payload,
        sender: Option<&ActorRef>,
    ) -> Result<AskOutcome, AskError> {
        match self.system.upgrade() {
            Some(system) => {
                let from = sender.map(|s| s.address.clone());
                SystemInner::ask_from(&system, &self.address, Action::new(kind, payload), from)
                    .await
            }
            None => Ok(AskOutcome::Cancelled),
        }
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorRef({})", self.address)
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for ActorRef {}
