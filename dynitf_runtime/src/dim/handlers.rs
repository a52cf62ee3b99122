//! Continuations for asynchronous add and resume requests.
//!
//! These run on an executor worker. They finish the state machine, then
//! report the outcome to the observer with the object lock released.

use std::sync::Arc;

use tracing::{debug, error};

use dynitf_core::{InterfaceError, InterfaceKind};

use crate::notify::{self, EventKind};
use crate::object::ObjectInner;

use super::{run_hook, settle, unexpected_state, Transition};

pub(super) fn complete(object: &Arc<ObjectInner>, transition: &'static Transition, kind: InterfaceKind) {
    let Some(index) = object.class.index_of(kind) else {
        debug_assert!(false, "continuation for undeclared interface kind {kind}");
        error!(object = %object.id, %kind, "Continuation for undeclared interface kind");
        return;
    };
    let interface = object.interface_at(index);

    let mut state = object.state.lock();
    let current = state.interfaces[index];
    let result = if current == transition.queued {
        state.interfaces[index] = transition.running;
        drop(state);

        run_hook(object, index, transition.hook);

        state = object.state.lock();
        settle(object, &mut state, transition, interface, index)
    } else if current == transition.aborted {
        // Aborted while waiting on the executor: the hook never runs
        state.interfaces[index] = transition.from;
        object.idle.notify_all();
        debug!(object = %object.id, interface = %interface, slot = index, "Asynchronous {} aborted", transition.name);
        Err(InterfaceError::OperationAborted(interface))
    } else {
        Err(unexpected_state(object, interface, transition.queued, current))
    };

    let registration = state.registration.clone();
    drop(state);

    notify::deliver(object, registration, EventKind::AsyncTermination, index, result);
}
