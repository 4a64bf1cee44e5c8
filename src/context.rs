//! `Context`: the capability object handed to every actor, scoped to that
//! actor's own address and parent.

use std::sync::Arc;

use futures::stream::BoxStream;
use uuid::Uuid;

use crate::actor::{ActorFactory, Enriched};
use crate::actor_ref::ActorRef;
use crate::error::{AskError, CreateError};
use crate::message::{IncomingMessage, Payload};
use crate::pattern::cleanup_cancelled_messages;
use crate::scheduler::Scheduler;
use crate::system::{ActorSystem, AskOutcome};

/// Everything an actor needs to act on its own behalf: who it is, who its
/// parent is, and a handle back to the system it lives in.
#[derive(Clone)]
pub struct Context {
    pub self_ref: ActorRef,
    pub parent: ActorRef,
    pub system: ActorSystem,
}

impl Context {
    pub(crate) fn new(self_ref: ActorRef, parent: ActorRef, system: ActorSystem) -> Self {
        Context {
            self_ref,
            parent,
            system,
        }
    }

    /// Spawns a child of the current actor. The child's address is this
    /// actor's address joined with `name` (or a generated uuid if absent).
    pub async fn actor_of(
        &self,
        factory: Arc<dyn ActorFactory>,
        name: Option<&str>,
    ) -> Result<ActorRef, CreateError> {
        let child_path = match name {
            Some(name) => self
                .self_ref
                .address()
                .child(name)
                .map_err(|e| CreateError::InvalidName(e.name))?,
            None => self
                .self_ref
                .address()
                .child(&Uuid::new_v4().to_string())
                .map_err(|e| CreateError::InvalidName(e.name))?,
        };
        self.system.actor_of_at(child_path, factory).await
    }

    /// Resolves a glob pattern to the matching live actors, anchored at
    /// this actor's address unless the pattern is absolute.
    pub fn actor_selection(&self, pattern: &str) -> Vec<ActorRef> {
        self.system
            .actor_selection_from(pattern, self.self_ref.address())
    }

    pub fn stop(&self, target: &ActorRef) {
        self.system.stop(target)
    }

    /// Fire-and-forget send to `target`, attributed to this actor so its
    /// handler resolves `Enriched::sender` back to us.
    pub fn tell(&self, target: &ActorRef, kind: impl Into<String>, payload: Payload) {
        target.tell_as(kind, payload, Some(&self.self_ref))
    }

    /// Request/response send to `target`, attributed to this actor.
    pub async fn ask(
        &self,
        target: &ActorRef,
        kind: impl Into<String>,
        payload: Payload,
    ) -> Result<AskOutcome, AskError> {
        target.ask_as(kind, payload, Some(&self.self_ref)).await
    }

    pub async fn graceful_stop(&self, targets: &[ActorRef]) -> Vec<Result<(), crate::error::ActorError>> {
        self.system.graceful_stop(targets).await
    }

    pub fn message_scheduler(&self) -> Arc<dyn Scheduler> {
        self.system.message_scheduler()
    }

    pub fn time_scheduler(&self) -> Arc<dyn Scheduler> {
        self.system.time_scheduler()
    }

    /// Wraps a stream of this actor's incoming messages (already filtered
    /// to one `action.kind` by the caller) so that only the latest of any
    /// burst survives: all superseded in-flight messages are published as
    /// cancellations on the system's cancellation channel.
    pub fn cleanup_cancelled_messages<F>(
        &self,
        incoming: BoxStream<'static, IncomingMessage>,
        action_kind: &str,
        user_fn: F,
    ) -> BoxStream<'static, crate::message::MessageResponse>
    where
        F: FnOnce(BoxStream<'static, Enriched>) -> BoxStream<'static, crate::message::MessageResponse>
            + Send
            + 'static,
    {
        cleanup_cancelled_messages(self.system.clone(), incoming, action_kind, user_fn)
    }
}
