//! The `Actor` trait, its lifecycle hooks, and the closed set of dispatch
//! patterns ([`Behavior`]) an actor may declare.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::actor_ref::ActorRef;
use crate::address::ActorPath;
use crate::context::Context;
use crate::message::{Action, MessageResponse, Payload};

/// A single incoming message, enriched with a `respond` callback and the
/// resolved `sender` reference, as handed to `receive` and `mapped_methods`
/// handlers.
pub struct Enriched {
    pub message_id: Uuid,
    pub action: Action,
    pub sender: Option<ActorRef>,
    pub respond: RespondFn,
}

/// Publishes the response to the message this closure was derived from —
/// `Ok` for a value, `Err` to raise a user-level [`crate::error::AskError::User`].
pub type RespondFn = Arc<dyn Fn(Result<Payload, String>) + Send + Sync>;

pub type ReceiveFn = Box<dyn FnMut(Enriched) -> BoxFuture<'static, ()> + Send>;

pub type MethodFn =
    Box<dyn Fn(BoxStream<'static, Enriched>) -> BoxStream<'static, MessageResponse> + Send + Sync>;

pub type SetupFn =
    Box<dyn FnOnce(BoxStream<'static, crate::message::IncomingMessage>) -> BoxStream<'static, MessageResponse> + Send>;

/// The closed sum type of dispatch patterns an actor may declare. An actor
/// picks exactly one by returning it from [`Actor::behavior`]; there is no
/// way to declare more than one at a time, which settles the original
/// "first adapter wins" ambiguity by construction.
pub enum Behavior {
    /// Callback-style: one handler invoked per incoming message.
    Receive(ReceiveFn),
    /// A handler per `action.kind`, each consuming an enriched sub-stream
    /// and producing a stream of responses.
    MappedMethods(HashMap<String, MethodFn>),
    /// A handler that owns the entire incoming stream and produces the
    /// entire outgoing stream.
    SetupReceive(SetupFn),
}

/// Builds a fresh actor instance for initial construction and for
/// reincarnation after a restart.
pub trait ActorFactory: Send + Sync {
    fn create(&self, path: ActorPath, ctx: Context) -> Box<dyn Actor>;
}

impl<F> ActorFactory for F
where
    F: Fn(ActorPath, Context) -> Box<dyn Actor> + Send + Sync,
{
    fn create(&self, path: ActorPath, ctx: Context) -> Box<dyn Actor> {
        (self)(path, ctx)
    }
}

/// An addressable unit of behavior. Lifecycle hooks have empty default
/// bodies; only [`Actor::behavior`] must be implemented.
#[async_trait]
pub trait Actor: Send + 'static {
    /// Invoked once, before the actor is registered and able to receive
    /// messages. Panics here terminate construction without invoking the
    /// supervision strategy.
    async fn pre_start(&mut self, _ctx: &Context) {}

    /// Invoked once, immediately after registration.
    async fn post_start(&mut self, _ctx: &Context) {}

    /// Invoked on the doomed incarnation just before a restart replaces it.
    async fn pre_restart(&mut self, _ctx: &Context) {}

    /// Invoked on the new incarnation immediately after a restart.
    async fn post_restart(&mut self, _ctx: &Context) {}

    /// Invoked after the actor has been deregistered and will receive no
    /// further messages.
    async fn post_stop(&mut self) {}

    /// Declares this actor's single dispatch pattern.
    fn behavior(&mut self, ctx: &Context) -> Behavior;
}
