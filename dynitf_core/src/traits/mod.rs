//! Trait definitions for the collaborators of the runtime.

mod executor;

pub use executor::{Executor, Task};
