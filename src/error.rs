//! Error taxonomy for the actor runtime. Errors are hand-rolled enums
//! implementing [`std::error::Error`] rather than derived, matching the
//! rest of the crate's avoidance of proc-macro-heavy dependencies in its
//! public surface.

use std::fmt;

use crate::address::ActorPath;

/// Errors raised while an actor is running: delivering a message, handling
/// an action, or failing mid-dispatch.
#[derive(Clone)]
pub enum ActorError {
    /// Raised by actor code itself; carried back to the caller of `ask`.
    User(String),
    /// A supervision call was made with a reference that does not resolve
    /// to a live actor.
    InvalidReference(ActorPath),
    /// The addressed actor has no handler for the action's `kind`.
    UnknownAction(String),
    /// The arbiter found no actor registered at this address.
    LostDestination(ActorPath),
    /// A handler panicked while processing a message.
    Panicked(ActorPath),
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorError::User(msg) => write!(f, "actor error: {}", msg),
            ActorError::InvalidReference(path) => {
                write!(f, "invalid actor reference: {}", path)
            }
            ActorError::UnknownAction(kind) => {
                write!(f, "no handler registered for action '{}'", kind)
            }
            ActorError::LostDestination(path) => {
                write!(f, "no actor registered at {}", path)
            }
            ActorError::Panicked(path) => {
                write!(f, "actor at {} panicked while handling a message", path)
            }
        }
    }
}

impl fmt::Debug for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for ActorError {}

/// Errors raised by [`crate::system::ActorSystem::actor_of`].
pub enum CreateError {
    /// The factory panicked while constructing the actor.
    Panicked,
    /// The requested name failed address validation.
    InvalidName(String),
    /// An actor is already registered at the resulting address.
    AlreadyExists(ActorPath),
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateError::Panicked => {
                f.write_str("failed to create actor: factory panicked while starting")
            }
            CreateError::InvalidName(name) => {
                write!(f, "failed to create actor: invalid name '{}'", name)
            }
            CreateError::AlreadyExists(path) => {
                write!(f, "failed to create actor: {} already exists", path)
            }
        }
    }
}

impl fmt::Debug for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for CreateError {}

/// Errors specific to the `ask` request/response path.
pub enum AskError {
    /// The target actor does not exist; the ask resolves as cancelled
    /// rather than erroring, but callers that want to distinguish "no such
    /// actor" from "actor declined to answer" can match on this.
    LostDestination(ActorPath),
    /// The actor responded with a user-level error.
    User(String),
}

impl fmt::Display for AskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskError::LostDestination(path) => write!(f, "no actor registered at {}", path),
            AskError::User(msg) => write!(f, "actor error: {}", msg),
        }
    }
}

impl fmt::Debug for AskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for AskError {}

impl From<ActorError> for AskError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::User(msg) => AskError::User(msg),
            ActorError::LostDestination(path) => AskError::LostDestination(path),
            ActorError::InvalidReference(path) => AskError::LostDestination(path),
            ActorError::UnknownAction(kind) => AskError::User(kind),
            ActorError::Panicked(path) => AskError::LostDestination(path),
        }
    }
}
