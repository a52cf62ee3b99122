//! Core type definitions.

mod result;
mod state;

pub use result::ResultCode;
pub use state::InterfaceState;

use serde::{Deserialize, Serialize};

/// How an add or resume request completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dispatch {
    /// Run the hook on the calling thread and return the final result.
    Synchronous,

    /// Queue the hook on the executor; the outcome arrives as a notification.
    Asynchronous,
}

impl Dispatch {
    pub fn is_async(self) -> bool {
        matches!(self, Self::Asynchronous)
    }
}

impl From<bool> for Dispatch {
    fn from(asynchronous: bool) -> Self {
        if asynchronous {
            Self::Asynchronous
        } else {
            Self::Synchronous
        }
    }
}
