//! Error types for dynamic interface management.
//!
//! Operation failures on a single interface are `InterfaceError`s, which are
//! cheap to clone so they can travel inside notifications. Everything else
//! rolls up into the root `Error`.

use thiserror::Error;

use crate::id::InterfaceId;
use crate::types::{InterfaceState, ResultCode};

/// Root error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),

    #[error("Executor error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Class definition error: {0}")]
    Class(#[from] ClassError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Teardown timed out after {0}ms with operations still in flight")]
    TeardownTimeout(u64),
}

/// Failure of an add, remove, resume or acquire operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("Interface identifier is nil")]
    ParameterInvalid,

    #[error("Interface not supported by this class: {0}")]
    FeatureUnsupported(InterfaceId),

    #[error("Interface not declared by this class: {0}")]
    NotDeclared(InterfaceId),

    #[error("Interface {interface} is {state}, operation not permitted")]
    PreconditionsViolated {
        interface: InterfaceId,
        state: InterfaceState,
    },

    #[error("Object is being destroyed")]
    ObjectDestroyed,

    #[error("Operation on interface {0} was aborted before it ran")]
    OperationAborted(InterfaceId),

    #[error("Asynchronous request rejected: {0}")]
    SubmissionFailed(#[from] SubmissionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InterfaceError {
    /// The numeric result code for this failure.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::ParameterInvalid => ResultCode::ParameterInvalid,
            Self::FeatureUnsupported(_) => ResultCode::FeatureUnsupported,
            Self::NotDeclared(_)
            | Self::PreconditionsViolated { .. }
            | Self::ObjectDestroyed => ResultCode::PreconditionsViolated,
            Self::OperationAborted(_) => ResultCode::OperationAborted,
            Self::SubmissionFailed(_) => ResultCode::ResourceError,
            Self::Internal(_) => ResultCode::InternalError,
        }
    }
}

/// Result code of an operation outcome, success included.
pub fn result_code(result: &std::result::Result<(), InterfaceError>) -> ResultCode {
    match result {
        Ok(()) => ResultCode::Success,
        Err(e) => e.code(),
    }
}

/// Rejection of a task by an executor.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Executor is shutting down")]
    ShuttingDown,

    #[error("Executor queue is full ({0} pending tasks)")]
    QueueFull(usize),
}

/// Errors found while validating a class layout.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassError {
    #[error("Class {0} declares no interfaces")]
    Empty(String),

    #[error("Class {class} declares {count} interfaces, the limit is {limit}")]
    TooManyInterfaces {
        class: String,
        count: usize,
        limit: usize,
    },

    #[error("Interface {0} is not registered")]
    Unregistered(InterfaceId),

    #[error("Interface {0} is declared twice")]
    Duplicate(InterfaceId),

    #[error("Interface at offset {offset} does not follow the previous offset {previous}")]
    Unordered { offset: usize, previous: usize },

    #[error("Interface offset {offset} lies outside the object size {size}")]
    OutOfBounds { offset: usize, size: usize },

    #[error("Unknown interface name: {0}")]
    UnknownName(String),
}

/// Result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
