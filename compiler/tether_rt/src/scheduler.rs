//! Delivery contexts for `observe_on`.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs delivery tasks in some execution context.
///
/// Implementations must run tasks in the order they were scheduled.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: Task);
}

/// Runs every task on the calling thread, immediately.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, task: Task) {
        task();
    }
}

/// Queues tasks until [`drain`](QueueScheduler::drain) is called.
///
/// Stands in for a UI-thread dispatcher: tests can observe that nothing is
/// delivered before the queue is pumped.
#[derive(Default)]
pub struct QueueScheduler {
    queue: Mutex<VecDeque<Task>>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run queued tasks (including any they enqueue) until the queue is
    /// empty. Returns how many ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop under the lock, run outside it.
            let next = self.queue.lock().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, task: Task) {
        self.queue.lock().push_back(task);
    }
}

impl std::fmt::Debug for QueueScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
