//! Per-slot interface states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one interface slot on one object.
///
/// `Uninitialized`, `Added` and `Suspended` are stable. Every other state
/// marks an operation in flight and rejects new operations on the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InterfaceState {
    /// Not active; storage is inert.
    Uninitialized = 0,

    /// Asynchronous add queued on the executor, still cancellable.
    Adding1 = 1,

    /// Asynchronous add queued, cancellation requested.
    Adding1A = 2,

    /// Activate hook running.
    Adding2 = 3,

    /// Active.
    Added = 4,

    /// Deactivate hook running.
    Removing = 5,

    /// Active but suspended after losing its resources.
    Suspended = 6,

    /// Asynchronous resume queued, still cancellable.
    Resuming1 = 7,

    /// Asynchronous resume queued, cancellation requested.
    Resuming1A = 8,

    /// Resume hook running.
    Resuming2 = 9,
}

impl InterfaceState {
    /// Whether no operation is in flight on the slot.
    pub fn is_stable(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Added | Self::Suspended)
    }

    /// Whether an operation is in flight on the slot.
    pub fn is_transitional(self) -> bool {
        !self.is_stable()
    }

    /// The aborted counterpart of a queued state.
    pub fn aborted(self) -> Option<Self> {
        match self {
            Self::Adding1 => Some(Self::Adding1A),
            Self::Resuming1 => Some(Self::Resuming1A),
            _ => None,
        }
    }
}

impl Default for InterfaceState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl fmt::Display for InterfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Adding1 => "adding (queued)",
            Self::Adding1A => "adding (aborted)",
            Self::Adding2 => "adding",
            Self::Added => "added",
            Self::Removing => "removing",
            Self::Suspended => "suspended",
            Self::Resuming1 => "resuming (queued)",
            Self::Resuming1A => "resuming (aborted)",
            Self::Resuming2 => "resuming",
        };
        f.write_str(name)
    }
}
