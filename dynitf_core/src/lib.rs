//! Dynitf Core - shared vocabulary for dynamic interface management
//!
//! This crate defines the identifiers, error taxonomy, slot states and
//! executor trait used by the runtime and its executors.

pub mod error;
pub mod id;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{result_code, ClassError, Error, InterfaceError, Result, SubmissionError};
pub use id::{InterfaceId, ObjectId};
pub use registry::{InterfaceKind, InterfaceRegistry};
pub use traits::{Executor, Task};
pub use types::{Dispatch, InterfaceState, ResultCode};
