//! Injectable scheduling hand-off points. Production code uses the Tokio
//! executor directly; `conduit-testkit`'s virtual scheduler lets tests step
//! through dispatch deterministically instead of racing the real runtime.

/// A hand-off point for a unit of work. The default implementation spawns
/// onto the Tokio runtime (macrotask semantics); swapping in a virtual
/// scheduler makes dispatch step-able from test code.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

/// Hands work directly to `tokio::spawn`. Jobs scheduled through this
/// crate are always cheap enqueue operations, so there is no need for
/// `spawn_blocking`.
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        tokio::spawn(async move { job() });
    }
}

#[cfg(feature = "testkit")]
impl Scheduler for conduit_testkit::VirtualScheduler {
    fn schedule(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        self.push(job);
    }
}
