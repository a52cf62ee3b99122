//! Deferred executor.
//!
//! Queues tasks without running them. Tasks run on whichever thread calls
//! `run_pending` or `run_one`, which makes the interleaving of submission,
//! cancellation and completion fully controllable.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use dynitf_core::{Executor, SubmissionError, Task};

/// An executor that runs tasks only on demand.
#[derive(Default)]
pub struct DeferredExecutor {
    queue: Mutex<VecDeque<Task>>,
    capacity: Option<usize>,
    closed: AtomicBool,
}

impl DeferredExecutor {
    /// Create an executor with an unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor that rejects work beyond `capacity` queued tasks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Reject all further submissions, as a shut-down executor would.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Accept submissions again.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest queued task. Returns false if the queue was empty.
    pub fn run_one(&self) -> bool {
        // The queue lock is released before the task runs
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run queued tasks until the queue is empty, including any tasks the
    /// running tasks submit. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        trace!(ran, "Deferred tasks executed");
        ran
    }
}

impl Executor for DeferredExecutor {
    fn submit(&self, task: Task) -> Result<(), SubmissionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SubmissionError::ShuttingDown);
        }

        let mut queue = self.queue.lock();
        if let Some(capacity) = self.capacity {
            if queue.len() >= capacity {
                return Err(SubmissionError::QueueFull(capacity));
            }
        }
        queue.push_back(task);
        Ok(())
    }
}
