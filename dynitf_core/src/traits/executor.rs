//! Executor trait definitions.

use crate::error::SubmissionError;

/// A unit of work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Background executor that runs continuations on its own threads.
///
/// # Examples
///
/// ```
/// use dynitf_core::{Executor, SubmissionError, Task};
///
/// struct SpawnExecutor;
///
/// impl Executor for SpawnExecutor {
///     fn submit(&self, task: Task) -> Result<(), SubmissionError> {
///         std::thread::spawn(task);
///         Ok(())
///     }
/// }
/// ```
pub trait Executor: Send + Sync {
    /// Queue a task for execution.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the task was accepted. It will run exactly once.
    /// * `Err(SubmissionError)` if the task was rejected. It is dropped
    ///   without running.
    fn submit(&self, task: Task) -> Result<(), SubmissionError>;
}
