//! Dynamic interface management.
//!
//! Adds, removes and resumes interfaces of an object. Each slot runs a small
//! state machine: an operation first claims the slot by moving it into a
//! transitional state under the object lock, then releases the lock to run
//! the hook or to hand a continuation to the executor, and finally re-locks
//! and checks the state again before settling it.

mod handlers;

use std::sync::Arc;

use tracing::{debug, error, warn};

use dynitf_core::{Dispatch, InterfaceError, InterfaceId, InterfaceKind, InterfaceState};

use crate::notify::{InterfaceCallback, NotifyContext, Registration};
use crate::object::{ComponentObject, ObjectInner, ObjectState};

#[derive(Clone, Copy, Debug)]
pub(crate) enum HookKind {
    Activate,
    Resume,
}

/// The states an add or resume walks through.
#[derive(Debug)]
pub(crate) struct Transition {
    pub(crate) name: &'static str,
    /// Stable state the operation starts from, and returns to when aborted.
    pub(crate) from: InterfaceState,
    pub(crate) queued: InterfaceState,
    pub(crate) aborted: InterfaceState,
    pub(crate) running: InterfaceState,
    pub(crate) hook: HookKind,
}

pub(crate) static ADD: Transition = Transition {
    name: "add",
    from: InterfaceState::Uninitialized,
    queued: InterfaceState::Adding1,
    aborted: InterfaceState::Adding1A,
    running: InterfaceState::Adding2,
    hook: HookKind::Activate,
};

pub(crate) static RESUME: Transition = Transition {
    name: "resume",
    from: InterfaceState::Suspended,
    queued: InterfaceState::Resuming1,
    aborted: InterfaceState::Resuming1A,
    running: InterfaceState::Resuming2,
    hook: HookKind::Resume,
};

/// Handle for managing the interfaces of one object.
#[derive(Clone)]
pub struct DynamicInterfaceManagement {
    object: Arc<ObjectInner>,
}

impl DynamicInterfaceManagement {
    pub(crate) fn new(object: Arc<ObjectInner>) -> Self {
        Self { object }
    }

    /// The object this handle manages.
    pub fn object(&self) -> ComponentObject {
        ComponentObject::from_inner(Arc::clone(&self.object))
    }

    /// Activate an uninitialized interface.
    ///
    /// Synchronously, the activate hook has run when this returns `Ok`.
    /// Asynchronously, `Ok` only means the request was queued; the outcome
    /// arrives as an `AsyncTermination` event.
    pub fn add_interface(
        &self,
        interface: &InterfaceId,
        dispatch: Dispatch,
    ) -> Result<(), InterfaceError> {
        if interface.is_nil() {
            return Err(InterfaceError::ParameterInvalid);
        }
        let (kind, index) = self
            .object
            .class
            .resolve(interface)
            .ok_or(InterfaceError::FeatureUnsupported(*interface))?;

        self.begin(&ADD, *interface, kind, index, dispatch)
    }

    /// Resume a suspended interface. Completes like `add_interface`.
    pub fn resume_interface(
        &self,
        interface: &InterfaceId,
        dispatch: Dispatch,
    ) -> Result<(), InterfaceError> {
        if interface.is_nil() {
            return Err(InterfaceError::ParameterInvalid);
        }
        let (kind, index) = self
            .object
            .class
            .resolve(interface)
            .ok_or(InterfaceError::NotDeclared(*interface))?;

        self.begin(&RESUME, *interface, kind, index, dispatch)
    }

    /// Deactivate an added or suspended interface.
    ///
    /// Always synchronous. Rejected while any other operation is in flight on
    /// the slot; a pending resume is never cancelled implicitly.
    pub fn remove_interface(&self, interface: &InterfaceId) -> Result<(), InterfaceError> {
        if interface.is_nil() {
            return Err(InterfaceError::ParameterInvalid);
        }
        let (_, index) = self
            .object
            .class
            .resolve(interface)
            .ok_or(InterfaceError::NotDeclared(*interface))?;
        let object = &self.object;

        let mut state = object.state.lock();
        if state.destroying {
            return Err(InterfaceError::ObjectDestroyed);
        }
        match state.interfaces[index] {
            InterfaceState::Added | InterfaceState::Suspended => {
                state.interfaces[index] = InterfaceState::Removing;
                state.acquired &= !(1u64 << index);
                drop(state);

                object.deactivate(index);

                let mut state = object.state.lock();
                match state.interfaces[index] {
                    InterfaceState::Removing => {
                        state.interfaces[index] = InterfaceState::Uninitialized;
                        object.idle.notify_all();
                        debug!(object = %object.id, interface = %interface, slot = index, "Interface removed");
                        Ok(())
                    }
                    found => Err(unexpected_state(
                        object,
                        *interface,
                        InterfaceState::Removing,
                        found,
                    )),
                }
            }
            current => Err(InterfaceError::PreconditionsViolated {
                interface: *interface,
                state: current,
            }),
        }
    }

    /// Replace the observer. `None` removes it.
    ///
    /// Events already being delivered keep using the registration they
    /// captured.
    pub fn register_callback(
        &self,
        callback: Option<InterfaceCallback>,
        context: Option<NotifyContext>,
    ) {
        let registration = callback.map(|callback| Registration { callback, context });
        self.object.state.lock().registration = registration;
    }

    fn begin(
        &self,
        transition: &'static Transition,
        interface: InterfaceId,
        kind: InterfaceKind,
        index: usize,
        dispatch: Dispatch,
    ) -> Result<(), InterfaceError> {
        let object = &self.object;

        let mut state = object.state.lock();
        if state.destroying {
            return Err(InterfaceError::ObjectDestroyed);
        }
        let current = state.interfaces[index];
        if current != transition.from {
            return Err(InterfaceError::PreconditionsViolated {
                interface,
                state: current,
            });
        }

        match dispatch {
            Dispatch::Asynchronous => {
                state.interfaces[index] = transition.queued;
                drop(state);

                let continuation = Arc::clone(object);
                let submitted = object.executor.submit(Box::new(move || {
                    handlers::complete(&continuation, transition, kind);
                }));

                if let Err(e) = submitted {
                    // Nobody else can have progressed the slot past queued or
                    // aborted, but a teardown may have aborted it meanwhile
                    let mut state = object.state.lock();
                    let current = state.interfaces[index];
                    if current == transition.queued || current == transition.aborted {
                        state.interfaces[index] = transition.from;
                        object.idle.notify_all();
                    } else {
                        debug!(object = %object.id, interface = %interface, state = %current, "Slot moved on, leaving it");
                    }
                    warn!(object = %object.id, interface = %interface, error = %e, "Asynchronous {} rejected", transition.name);
                    return Err(e.into());
                }

                debug!(object = %object.id, interface = %interface, slot = index, "Asynchronous {} queued", transition.name);
                Ok(())
            }
            Dispatch::Synchronous => {
                state.interfaces[index] = transition.running;
                drop(state);

                run_hook(object, index, transition.hook);

                let mut state = object.state.lock();
                settle(object, &mut state, transition, interface, index)
            }
        }
    }
}

impl std::fmt::Debug for DynamicInterfaceManagement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicInterfaceManagement")
            .field("object", &self.object.id)
            .finish()
    }
}

fn run_hook(object: &Arc<ObjectInner>, index: usize, hook: HookKind) {
    match hook {
        HookKind::Activate => object.activate(index),
        HookKind::Resume => object.resume(index),
    }
}

/// Finish a transition after its hook ran. Called with the object lock
/// re-acquired; the slot must still be in the running state.
fn settle(
    object: &ObjectInner,
    state: &mut ObjectState,
    transition: &Transition,
    interface: InterfaceId,
    index: usize,
) -> Result<(), InterfaceError> {
    let found = state.interfaces[index];
    if found != transition.running {
        return Err(unexpected_state(object, interface, transition.running, found));
    }

    state.interfaces[index] = InterfaceState::Added;
    object.idle.notify_all();
    debug!(object = %object.id, interface = %interface, slot = index, "Interface {} complete", transition.name);
    Ok(())
}

/// Report a slot state that correct synchronization makes unreachable.
fn unexpected_state(
    object: &ObjectInner,
    interface: InterfaceId,
    expected: InterfaceState,
    found: InterfaceState,
) -> InterfaceError {
    debug_assert!(
        false,
        "interface {interface}: expected state {expected}, found {found}"
    );
    error!(object = %object.id, interface = %interface, %expected, %found, "Unexpected interface state");
    InterfaceError::Internal(format!(
        "interface {interface} expected to be {expected}, found {found}"
    ))
}
