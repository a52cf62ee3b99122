//! Component objects.
//!
//! An object owns one exclusive lock guarding every slot state, the
//! acquisition mask and the notification registration. Storage cells sit
//! outside that lock so hooks can work on them while it is released.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use dynitf_core::{Error, Executor, InterfaceError, InterfaceId, InterfaceState, ObjectId};

use crate::class::ClassDescriptor;
use crate::dim::DynamicInterfaceManagement;
use crate::notify::{self, EventKind, Registration};
use crate::storage::{InterfaceStorage, REMOVED_FILL};

/// Per-object behaviour switches.
#[derive(Clone, Debug)]
pub struct ObjectOptions {
    /// Overwrite removed interface storage with `REMOVED_FILL`.
    pub poison_removed: bool,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            poison_removed: cfg!(debug_assertions),
        }
    }
}

/// State guarded by the object lock.
pub(crate) struct ObjectState {
    pub(crate) interfaces: Vec<InterfaceState>,
    /// Bit `i` set once slot `i` has been handed out by `get_interface`.
    pub(crate) acquired: u64,
    pub(crate) registration: Option<Registration>,
    pub(crate) destroying: bool,
}

pub(crate) struct ObjectInner {
    pub(crate) id: ObjectId,
    pub(crate) class: Arc<ClassDescriptor>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) options: ObjectOptions,
    pub(crate) state: Mutex<ObjectState>,
    /// Signalled whenever a slot returns to a stable state.
    pub(crate) idle: Condvar,
    /// `None` while a hook of the slot holds the cell.
    pub(crate) storage: Vec<Mutex<Option<InterfaceStorage>>>,
}

impl ObjectInner {
    /// Reset the slot's storage and run its activate hook.
    ///
    /// Must be called without the object lock held.
    pub(crate) fn activate(self: &Arc<Self>, index: usize) {
        let hooks = Arc::clone(self.class.entries()[index].hooks());
        self.with_checked_out(index, |storage| {
            storage.reset();
            hooks.on_activate(storage);
        });
    }

    /// Run the slot's resume hook. Must be called without the object lock held.
    pub(crate) fn resume(self: &Arc<Self>, index: usize) {
        let hooks = Arc::clone(self.class.entries()[index].hooks());
        self.with_checked_out(index, |storage| hooks.on_resume(storage));
    }

    /// Run the slot's deactivate hook, then poison the storage if enabled.
    ///
    /// Must be called without the object lock held.
    pub(crate) fn deactivate(self: &Arc<Self>, index: usize) {
        let hooks = Arc::clone(self.class.entries()[index].hooks());
        let poison = self.options.poison_removed;
        self.with_checked_out(index, |storage| {
            hooks.on_deactivate(storage);
            if poison {
                storage.fill(REMOVED_FILL);
            }
        });
    }

    /// Take the slot's cell out, run `f` on it with no lock held, and put it back.
    ///
    /// Readers see the slot as unavailable meanwhile. Only the operation
    /// that claimed the slot may call this.
    fn with_checked_out<R>(
        self: &Arc<Self>,
        index: usize,
        f: impl FnOnce(&mut InterfaceStorage) -> R,
    ) -> R {
        let cell = self.storage[index].lock().take();
        let mut cell = cell.unwrap_or_else(|| {
            debug_assert!(false, "storage of slot {index} already checked out");
            error!(object = %self.id, slot = index, "Storage already checked out, replacing it");
            InterfaceStorage::new(
                index,
                self.class.region(index).unwrap_or(0..0),
                Arc::downgrade(self),
            )
        });

        let result = f(&mut cell);
        *self.storage[index].lock() = Some(cell);
        result
    }

    pub(crate) fn interface_at(&self, index: usize) -> InterfaceId {
        self.class.entries()[index].interface()
    }
}

/// Move every queued slot to its aborted counterpart.
fn abort_queued(interfaces: &mut [InterfaceState]) -> usize {
    let mut aborted = 0;
    for state in interfaces.iter_mut() {
        if let Some(next) = state.aborted() {
            *state = next;
            aborted += 1;
        }
    }
    aborted
}

/// A component object with dynamically managed interfaces.
///
/// Cloning yields another handle to the same object.
#[derive(Clone)]
pub struct ComponentObject {
    inner: Arc<ObjectInner>,
}

impl ComponentObject {
    /// Create an object of `class` whose asynchronous work runs on `executor`.
    pub fn new(class: Arc<ClassDescriptor>, executor: Arc<dyn Executor>) -> Self {
        Self::with_options(class, executor, ObjectOptions::default())
    }

    /// Create an object with explicit options.
    pub fn with_options(
        class: Arc<ClassDescriptor>,
        executor: Arc<dyn Executor>,
        options: ObjectOptions,
    ) -> Self {
        let count = class.interface_count();
        let inner = Arc::new_cyclic(|owner| {
            let storage = (0..count)
                .map(|index| {
                    let region = class.region(index).unwrap_or(0..0);
                    Mutex::new(Some(InterfaceStorage::new(index, region, owner.clone())))
                })
                .collect();

            ObjectInner {
                id: ObjectId::new(),
                class,
                executor,
                options,
                state: Mutex::new(ObjectState {
                    interfaces: vec![InterfaceState::Uninitialized; count],
                    acquired: 0,
                    registration: None,
                    destroying: false,
                }),
                idle: Condvar::new(),
                storage,
            }
        });

        debug!(
            object = %inner.id,
            class = inner.class.name(),
            interfaces = count,
            "Object created"
        );

        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<ObjectInner>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.inner.class
    }

    /// The dynamic interface management interface of this object.
    pub fn dynamic_interface_management(&self) -> DynamicInterfaceManagement {
        DynamicInterfaceManagement::new(Arc::clone(&self.inner))
    }

    /// Current state of an interface, or `None` if the class does not declare it.
    pub fn interface_state(&self, interface: &InterfaceId) -> Option<InterfaceState> {
        let (_, index) = self.inner.class.resolve(interface)?;
        Some(self.inner.state.lock().interfaces[index])
    }

    /// Snapshot of every slot state, in slot order.
    pub fn interface_states(&self) -> Vec<InterfaceState> {
        self.inner.state.lock().interfaces.clone()
    }

    /// Whether the interface has been acquired since it was last removed.
    pub fn is_acquired(&self, interface: &InterfaceId) -> bool {
        match self.inner.class.resolve(interface) {
            Some((_, index)) => self.inner.state.lock().acquired & (1u64 << index) != 0,
            None => false,
        }
    }

    /// Acquire an active interface.
    pub fn get_interface(&self, interface: &InterfaceId) -> Result<InterfaceHandle, InterfaceError> {
        if interface.is_nil() {
            return Err(InterfaceError::ParameterInvalid);
        }
        let (_, index) = self
            .inner
            .class
            .resolve(interface)
            .ok_or(InterfaceError::FeatureUnsupported(*interface))?;

        let mut state = self.inner.state.lock();
        match state.interfaces[index] {
            InterfaceState::Added => {
                state.acquired |= 1u64 << index;
                Ok(InterfaceHandle {
                    object: self.clone(),
                    index,
                    interface: *interface,
                })
            }
            current => Err(InterfaceError::PreconditionsViolated {
                interface: *interface,
                state: current,
            }),
        }
    }

    /// Suspend an active interface after it lost its resources.
    ///
    /// The observer receives a `ResourcesLost` event.
    pub fn suspend_interface(&self, interface: &InterfaceId) -> Result<(), InterfaceError> {
        let index = self.declared_index(interface)?;

        let mut state = self.inner.state.lock();
        match state.interfaces[index] {
            InterfaceState::Added => {
                state.interfaces[index] = InterfaceState::Suspended;
                let registration = state.registration.clone();
                drop(state);

                info!(object = %self.id(), interface = %interface, slot = index, "Interface suspended");
                notify::deliver(&self.inner, registration, EventKind::ResourcesLost, index, Ok(()));
                Ok(())
            }
            current => Err(InterfaceError::PreconditionsViolated {
                interface: *interface,
                state: current,
            }),
        }
    }

    /// Tell the observer that a suspended interface could be resumed now.
    pub fn signal_resources_available(&self, interface: &InterfaceId) -> Result<(), InterfaceError> {
        let index = self.declared_index(interface)?;

        let state = self.inner.state.lock();
        match state.interfaces[index] {
            InterfaceState::Suspended => {
                let registration = state.registration.clone();
                drop(state);

                notify::deliver(
                    &self.inner,
                    registration,
                    EventKind::ResourcesAvailable,
                    index,
                    Ok(()),
                );
                Ok(())
            }
            current => Err(InterfaceError::PreconditionsViolated {
                interface: *interface,
                state: current,
            }),
        }
    }

    /// Flag every queued asynchronous operation as aborted.
    ///
    /// The continuations still run, report `OperationAborted` and restore the
    /// previous stable state without invoking any hook. Operations whose hook
    /// is already running are not affected. Returns the number of slots
    /// flagged.
    pub fn abort_pending(&self) -> usize {
        let mut state = self.inner.state.lock();
        let aborted = abort_queued(&mut state.interfaces);
        if aborted > 0 {
            debug!(object = %self.id(), aborted, "Queued operations aborted");
        }
        aborted
    }

    /// Prepare the object for destruction.
    ///
    /// Rejects all further add, remove and resume requests, aborts queued
    /// operations and waits until no slot has an operation in flight.
    pub fn teardown(&self, timeout: Duration) -> dynitf_core::Result<()> {
        // Too far out to represent means no deadline
        let deadline = Instant::now().checked_add(timeout);

        let mut state = self.inner.state.lock();
        state.destroying = true;
        let aborted = abort_queued(&mut state.interfaces);
        debug!(object = %self.id(), aborted, "Teardown started");

        while state.interfaces.iter().any(|s| s.is_transitional()) {
            let Some(deadline) = deadline else {
                self.inner.idle.wait(&mut state);
                continue;
            };
            let timed_out = self.inner.idle.wait_until(&mut state, deadline).timed_out();
            if timed_out && state.interfaces.iter().any(|s| s.is_transitional()) {
                warn!(object = %self.id(), "Teardown timed out with operations in flight");
                let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(Error::TeardownTimeout(millis));
            }
        }

        debug!(object = %self.id(), "Teardown complete");
        Ok(())
    }

    /// Whether `teardown` has been called.
    pub fn is_destroying(&self) -> bool {
        self.inner.state.lock().destroying
    }

    /// Inspect an interface's storage.
    ///
    /// Returns `None` if the class does not declare the interface, or while
    /// one of its hooks is running.
    pub fn with_storage<R>(
        &self,
        interface: &InterfaceId,
        f: impl FnOnce(&InterfaceStorage) -> R,
    ) -> Option<R> {
        let (_, index) = self.inner.class.resolve(interface)?;
        let storage = self.inner.storage[index].lock();
        storage.as_ref().map(f)
    }

    fn declared_index(&self, interface: &InterfaceId) -> Result<usize, InterfaceError> {
        if interface.is_nil() {
            return Err(InterfaceError::ParameterInvalid);
        }
        self.inner
            .class
            .resolve(interface)
            .map(|(_, index)| index)
            .ok_or(InterfaceError::NotDeclared(*interface))
    }
}

impl std::fmt::Debug for ComponentObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentObject")
            .field("id", &self.inner.id)
            .field("class", &self.inner.class.name())
            .finish()
    }
}

/// An acquired interface of an object.
#[derive(Clone, Debug)]
pub struct InterfaceHandle {
    object: ComponentObject,
    index: usize,
    interface: InterfaceId,
}

impl InterfaceHandle {
    pub fn interface(&self) -> InterfaceId {
        self.interface
    }

    pub fn object(&self) -> &ComponentObject {
        &self.object
    }

    /// Current state of the underlying slot.
    pub fn state(&self) -> InterfaceState {
        self.object.inner.state.lock().interfaces[self.index]
    }

    /// Inspect the storage. `None` while a hook of this slot is running.
    pub fn with_storage<R>(&self, f: impl FnOnce(&InterfaceStorage) -> R) -> Option<R> {
        self.object.inner.storage[self.index].lock().as_ref().map(f)
    }

    pub fn with_storage_mut<R>(&self, f: impl FnOnce(&mut InterfaceStorage) -> R) -> Option<R> {
        self.object.inner.storage[self.index].lock().as_mut().map(f)
    }
}
