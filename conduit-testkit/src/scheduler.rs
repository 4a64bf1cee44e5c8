use std::collections::VecDeque;
use std::sync::Mutex;

/// A deterministic stand-in for the runtime's message/time scheduler.
///
/// Instead of handing work to the Tokio executor immediately, closures are
/// queued and only run when the test explicitly calls [`VirtualScheduler::run_next`]
/// or [`VirtualScheduler::run_all`]. This lets tests assert on ordering and
/// supersession without racing a real scheduler tick.
#[derive(Default)]
pub struct VirtualScheduler {
    queue: Mutex<VecDeque<Box<dyn FnOnce() + Send>>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueue a unit of work; it does not run until stepped.
    pub fn push(&self, job: Box<dyn FnOnce() + Send>) {
        self.queue.lock().unwrap().push_back(job);
    }

    /// Run the oldest queued job, if any. Returns whether a job ran.
    pub fn run_next(&self) -> bool {
        let job = self.queue.lock().unwrap().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run every job currently queued, including ones enqueued by earlier
    /// jobs in this same call.
    pub fn run_all(&self) {
        while self.run_next() {}
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::VirtualScheduler;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn jobs_run_only_when_stepped() {
        let sched = VirtualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        sched.push(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        sched.run_all();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
