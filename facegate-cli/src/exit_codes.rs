//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a rejected face apart from a missing camera
//! or an unreachable service.

use facegate_core::{FacegateError, FailureKind};

use crate::utils::FlowFailure;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (empty user id, invalid service URL).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Face not recognized or enrollment rejected.
/// Maps to EX_DATAERR from sysexits.h.
pub const REJECTED: i32 = 65;

/// Camera unavailable.
/// Maps to EX_NOINPUT from sysexits.h.
pub const CAMERA_ERROR: i32 = 66;

/// Verification service unavailable or failing.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const SERVICE_ERROR: i32 = 69;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = if let Some(failure) = err.downcast_ref::<FlowFailure>() {
            for_failure(failure.kind)
        } else if let Some(FacegateError::Config(_)) = err.downcast_ref::<FacegateError>() {
            USAGE_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}

/// Exit code for a failure reported by the session.
pub fn for_failure(kind: FailureKind) -> i32 {
    match kind {
        FailureKind::Validation => USAGE_ERROR,
        FailureKind::Device => CAMERA_ERROR,
        FailureKind::Enrollment | FailureKind::NotRecognized => REJECTED,
        FailureKind::Verification => SERVICE_ERROR,
    }
}
