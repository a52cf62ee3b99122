//! Dynitf Runtime - dynamically activated object interfaces
//!
//! Objects of a class expose a fixed set of optional interfaces that stay
//! inert until added at runtime. This crate implements the per-interface
//! state machine behind adding, removing and resuming them, synchronously
//! or through a background executor, together with notification of
//! asynchronous outcomes and the teardown path that cancels queued work.

pub mod class;
pub mod config;
mod dim;
pub mod engine;
pub mod hooks;
pub mod notify;
mod object;
pub mod storage;

pub use class::{ClassBuilder, ClassDescriptor, InterfaceEntry, MAX_INTERFACES};
pub use config::{load_config, save_config, ClassConfig, InterfaceConfig, RuntimeConfig};
pub use dim::DynamicInterfaceManagement;
pub use engine::Engine;
pub use hooks::{InterfaceHooks, NoHooks};
pub use notify::{callback, EventKind, InterfaceCallback, InterfaceEvent, NotifyContext};
pub use object::{ComponentObject, InterfaceHandle, ObjectOptions};
pub use storage::{InterfaceStorage, REMOVED_FILL};

pub use dynitf_core::{
    Dispatch, Error, Executor, InterfaceError, InterfaceId, InterfaceKind, InterfaceRegistry,
    InterfaceState, ObjectId, Result, ResultCode,
};
