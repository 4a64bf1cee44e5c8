//! Message envelopes exchanged between actors: the action payload an actor
//! receives, and the response/cancellation envelopes correlated back to a
//! caller by message id.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::address::ActorPath;

/// A type-erased message payload, the Rust analogue of the original's
/// untyped `any` field. Handlers recover the concrete type with
/// [`Payload::downcast`].
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Payload(Arc::new(value))
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// The dispatch key (`kind`) plus the carried data for a message sent to
/// an actor.
#[derive(Clone, Debug)]
pub struct Action {
    pub kind: String,
    pub payload: Payload,
}

impl Action {
    pub fn new(kind: impl Into<String>, payload: Payload) -> Self {
        Action {
            kind: kind.into(),
            payload,
        }
    }
}

/// An envelope delivered to an actor's mailbox.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub message_id: Uuid,
    pub address: ActorPath,
    pub action: Action,
    /// The address of the actor (or ask caller) that sent this message, if
    /// any — used to construct a `sender` reference inside handlers.
    pub context_creator: Option<ActorPath>,
}

/// An envelope emitted by an actor in response to an [`IncomingMessage`].
#[derive(Clone, Debug)]
pub struct MessageResponse {
    pub resp_id: Uuid,
    pub response: Option<Payload>,
    pub error: Option<String>,
    pub cancelled: bool,
}

impl MessageResponse {
    pub fn value(resp_id: Uuid, response: Payload) -> Self {
        MessageResponse {
            resp_id,
            response: Some(response),
            error: None,
            cancelled: false,
        }
    }

    pub fn error(resp_id: Uuid, error: impl Into<String>) -> Self {
        MessageResponse {
            resp_id,
            response: None,
            error: Some(error.into()),
            cancelled: false,
        }
    }

    pub fn cancelled(resp_id: Uuid) -> Self {
        MessageResponse {
            resp_id,
            response: None,
            error: None,
            cancelled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_roundtrips_through_downcast() {
        let payload = Payload::new(42u32);
        assert_eq!(payload.downcast::<u32>(), Some(&42u32));
        assert_eq!(payload.downcast::<String>(), None);
    }
}
