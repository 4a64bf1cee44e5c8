//! Test helpers for applications built on `conduit`: channel-based probes
//! for asserting on events emitted from actor handlers, and a virtual
//! scheduler that lets tests drive message/time dispatch deterministically
//! instead of racing the real Tokio scheduler.

pub mod probe;
pub mod scheduler;

pub use probe::{channel, Probe, ProbeReceive};
pub use scheduler::VirtualScheduler;
