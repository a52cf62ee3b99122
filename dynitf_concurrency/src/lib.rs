//! Dynitf Concurrency - executors for asynchronous continuations
//!
//! This crate provides the background executors the runtime hands
//! asynchronous add and resume requests to: a fixed-size thread pool
//! for production use and a deferred executor that only runs work
//! when asked to.

mod deferred;
mod pool;

pub use deferred::DeferredExecutor;
pub use pool::{PoolConfig, ThreadPool};
