//! Notification dispatch.
//!
//! An object has at most one observer. Events are delivered by direct call,
//! on the thread that completed the operation, after the object lock has
//! been released. Each delivery uses the registration captured while the
//! lock was still held.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use dynitf_core::{result_code, InterfaceError, InterfaceId, ResultCode};

use crate::dim::DynamicInterfaceManagement;
use crate::object::ObjectInner;

/// Opaque value handed back to the observer with every event.
pub type NotifyContext = Arc<dyn Any + Send + Sync>;

/// Observer callback.
pub type InterfaceCallback =
    Arc<dyn Fn(&DynamicInterfaceManagement, &InterfaceEvent) + Send + Sync>;

/// Wrap a closure as an `InterfaceCallback`.
pub fn callback<F>(f: F) -> InterfaceCallback
where
    F: Fn(&DynamicInterfaceManagement, &InterfaceEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What an event reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// An asynchronous add or resume finished, successfully or not.
    AsyncTermination,

    /// An active interface was suspended.
    ResourcesLost,

    /// A suspended interface can be resumed.
    ResourcesAvailable,
}

/// One event delivered to the observer.
#[derive(Clone)]
pub struct InterfaceEvent {
    pub kind: EventKind,
    pub interface: InterfaceId,
    pub result: Result<(), InterfaceError>,
    pub context: Option<NotifyContext>,
}

impl InterfaceEvent {
    pub fn code(&self) -> ResultCode {
        result_code(&self.result)
    }

    /// The registration context, if it has type `T`.
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for InterfaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceEvent")
            .field("kind", &self.kind)
            .field("interface", &self.interface)
            .field("result", &self.result)
            .field("context", &self.context.is_some())
            .finish()
    }
}

/// The single observer registration of an object.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) callback: InterfaceCallback,
    pub(crate) context: Option<NotifyContext>,
}

/// Deliver one event for slot `index`. Must be called without the object lock.
pub(crate) fn deliver(
    object: &Arc<ObjectInner>,
    registration: Option<Registration>,
    kind: EventKind,
    index: usize,
    result: Result<(), InterfaceError>,
) {
    let interface = object.interface_at(index);
    let Some(registration) = registration else {
        trace!(object = %object.id, interface = %interface, ?kind, "No observer registered");
        return;
    };

    let event = InterfaceEvent {
        kind,
        interface,
        result,
        context: registration.context,
    };
    trace!(object = %object.id, interface = %interface, ?kind, code = %event.code(), "Delivering event");

    let dim = DynamicInterfaceManagement::new(Arc::clone(object));
    (registration.callback)(&dim, &event);
}
