//! Lifecycle hooks for interface kinds.

use crate::storage::InterfaceStorage;

/// Behaviour run when an interface of a given kind changes state.
///
/// Every hook runs without the object lock held, on the thread that
/// performs the transition: the caller for synchronous requests, an
/// executor worker for asynchronous ones. Hooks for one slot never run
/// concurrently with each other.
///
/// A hook may call back into the object. While it runs, its slot's storage
/// is checked out: reading that slot through the object or a handle yields
/// `None` instead of blocking.
pub trait InterfaceHooks: Send + Sync {
    /// Runs after the storage has been reset to zero.
    fn on_activate(&self, _storage: &mut InterfaceStorage) {}

    /// Runs before the storage is released.
    fn on_deactivate(&self, _storage: &mut InterfaceStorage) {}

    /// Runs when a suspended interface is resumed. Storage is left as is.
    fn on_resume(&self, _storage: &mut InterfaceStorage) {}
}

/// Hooks for interfaces that need no lifecycle behaviour.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl InterfaceHooks for NoHooks {}
