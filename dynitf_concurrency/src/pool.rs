//! Fixed-size worker pool.
//!
//! Tasks travel over a bounded channel to a set of named worker threads.
//! A full queue rejects new work instead of blocking the submitter, and
//! shutdown drains whatever is already queued before the workers exit.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use dynitf_core::{Executor, SubmissionError, Task};

/// Configuration for a thread pool.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads. Zero means one per CPU.
    pub workers: usize,

    /// Maximum number of queued tasks not yet picked up by a worker.
    pub queue_capacity: usize,

    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: 64,
            thread_name: "dynitf-worker".to_string(),
        }
    }
}

/// A pool of worker threads running submitted tasks.
pub struct ThreadPool {
    /// Sending half of the task queue; `None` once shut down.
    sender: Mutex<Option<Sender<Task>>>,

    /// Worker join handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Queue capacity, reported in `QueueFull` errors.
    capacity: usize,

    /// Whether the pool is shutting down.
    shutting_down: AtomicBool,
}

impl ThreadPool {
    /// Start a new pool.
    pub fn new(config: PoolConfig) -> std::io::Result<Self> {
        let worker_count = if config.workers == 0 {
            num_cpus::get()
        } else {
            config.workers
        };
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = crossbeam_channel::bounded::<Task>(capacity);

        let mut workers = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, worker))
                .spawn(move || worker_loop(worker, receiver))?;
            workers.push(handle);
        }

        debug!(workers = worker_count, capacity, "Thread pool started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            capacity,
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Number of tasks waiting for a worker.
    pub fn pending(&self) -> usize {
        self.sender.lock().as_ref().map_or(0, |sender| sender.len())
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Stop accepting work, run what is already queued, and join the workers.
    ///
    /// Called from a worker thread, that worker is not joined.
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        // Dropping the sender lets workers drain the queue and exit
        self.sender.lock().take();

        let workers = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        for handle in workers {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("Worker thread terminated abnormally");
            }
        }

        debug!("Thread pool shut down");
    }
}

impl Executor for ThreadPool {
    fn submit(&self, task: Task) -> Result<(), SubmissionError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(SubmissionError::ShuttingDown);
        }

        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(SubmissionError::ShuttingDown)?;

        sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => SubmissionError::QueueFull(self.capacity),
            TrySendError::Disconnected(_) => SubmissionError::ShuttingDown,
        })
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(worker: usize, receiver: Receiver<Task>) {
    trace!(worker, "Worker started");

    while let Ok(task) = receiver.recv() {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(worker, "Task panicked");
        }
    }

    trace!(worker, "Worker exiting");
}
