//! An in-process actor runtime: address allocation, mailboxes, ask/tell
//! correlation and supervision lifecycle for message-driven actors.
//!
//! An actor is built from a factory and declares exactly one dispatch
//! pattern ([`actor::Behavior`]): a callback invoked per message, a set of
//! per-kind handlers each consuming a sub-stream, or a handler that owns
//! the whole mailbox stream. Requests are correlated by message id through
//! [`system::ActorSystem::ask`]; a burst of same-kind messages to an actor
//! wrapped in [`context::Context::cleanup_cancelled_messages`] collapses to
//! exactly one live response, with every superseded message resolved as a
//! cancellation rather than left dangling.

pub mod actor;
pub mod actor_ref;
pub mod address;
pub mod context;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod pattern;
pub mod scheduler;
pub mod settings;
pub mod system;

pub mod prelude {
    pub use crate::actor::{Actor, ActorFactory, Behavior, Enriched, MethodFn, ReceiveFn, SetupFn};
    pub use crate::actor_ref::ActorRef;
    pub use crate::address::ActorPath;
    pub use crate::context::Context;
    pub use crate::error::{ActorError, AskError, CreateError};
    pub use crate::message::{Action, IncomingMessage, MessageResponse, Payload};
    pub use crate::pattern::{cleanup_cancelled_messages, latest_async};
    pub use crate::scheduler::{Scheduler, TokioScheduler};
    pub use crate::settings::ActorSystemConfig;
    pub use crate::system::{ActorSystem, AskOutcome};
}
