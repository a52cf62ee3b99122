//! Numeric result codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result code reported to callers that want a flat numeric status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ResultCode {
    Success = 0,
    PreconditionsViolated = 1,
    ParameterInvalid = 2,
    ResourceError = 4,
    FeatureUnsupported = 12,
    InternalError = 13,
    OperationAborted = 15,
}

impl ResultCode {
    /// The raw numeric value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "SUCCESS",
            Self::PreconditionsViolated => "PRECONDITIONS_VIOLATED",
            Self::ParameterInvalid => "PARAMETER_INVALID",
            Self::ResourceError => "RESOURCE_ERROR",
            Self::FeatureUnsupported => "FEATURE_UNSUPPORTED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::OperationAborted => "OPERATION_ABORTED",
        };
        write!(f, "{} ({})", name, self.as_u32())
    }
}
