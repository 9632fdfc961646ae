//! Flow state for the session controller.
//!
//! Data that only exists within one step lives inside that step's variant:
//! captured images only exist in `Enroll::Camera`, the submitted identity only
//! once a flow has started. Leaving a step drops its data.

use serde::Serialize;

use crate::client::VerificationOutcome;
use crate::encoder::EncodedImage;

/// A trimmed, non-empty user identifier naming a face profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Trim user input; `None` if nothing remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one flow attempt. Bumped on every reset so that delayed tasks
/// and network completions from an earlier attempt can be recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level mode of the lock screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Choice,
    Enroll,
    Login,
}

#[derive(Debug)]
pub enum EnrollStep {
    Input,
    /// Camera open, collecting images. Always holds fewer than three.
    Camera {
        identity: Identity,
        captured: Vec<EncodedImage>,
    },
    /// Camera closed, enrollment request in flight.
    Submitting { identity: Identity },
    Success { identity: Identity },
}

#[derive(Debug)]
pub enum LoginStep {
    Input,
    /// Camera open, waiting for the automatic capture.
    Scan { identity: Identity },
    /// Camera closed, verification request in flight.
    Verifying { identity: Identity },
    Result { outcome: VerificationOutcome },
}

/// The single active state of the controller.
#[derive(Debug, Default)]
pub enum FlowState {
    #[default]
    Choice,
    Enroll(EnrollStep),
    Login(LoginStep),
}

impl FlowState {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Choice => Mode::Choice,
            Self::Enroll(_) => Mode::Enroll,
            Self::Login(_) => Mode::Login,
        }
    }

    /// Payload-free view of the state.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Choice => Phase::Choice,
            Self::Enroll(EnrollStep::Input) => Phase::EnrollInput,
            Self::Enroll(EnrollStep::Camera { captured, .. }) => Phase::EnrollCamera {
                captured: captured.len(),
            },
            Self::Enroll(EnrollStep::Submitting { .. }) => Phase::EnrollSubmitting,
            Self::Enroll(EnrollStep::Success { .. }) => Phase::EnrollSuccess,
            Self::Login(LoginStep::Input) => Phase::LoginInput,
            Self::Login(LoginStep::Scan { .. }) => Phase::LoginScan,
            Self::Login(LoginStep::Verifying { .. }) => Phase::LoginVerifying,
            Self::Login(LoginStep::Result { outcome }) => Phase::LoginResult {
                matched: outcome.matched,
            },
        }
    }

    /// Identity locked in for the active flow, if one has started.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Choice | Self::Enroll(EnrollStep::Input) | Self::Login(LoginStep::Input) => None,
            Self::Enroll(
                EnrollStep::Camera { identity, .. }
                | EnrollStep::Submitting { identity }
                | EnrollStep::Success { identity },
            ) => Some(identity),
            Self::Login(LoginStep::Scan { identity } | LoginStep::Verifying { identity }) => {
                Some(identity)
            }
            Self::Login(LoginStep::Result { outcome }) => Some(&outcome.identity),
        }
    }

    /// Whether this state owns an open camera.
    pub fn uses_camera(&self) -> bool {
        matches!(
            self,
            Self::Enroll(EnrollStep::Camera { .. }) | Self::Login(LoginStep::Scan { .. })
        )
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::Enroll(EnrollStep::Input) | Self::Login(LoginStep::Input)
        )
    }
}

/// Observable step of the flow, without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum Phase {
    Choice,
    EnrollInput,
    EnrollCamera { captured: usize },
    EnrollSubmitting,
    EnrollSuccess,
    LoginInput,
    LoginScan,
    LoginVerifying,
    LoginResult { matched: bool },
}

impl Phase {
    pub fn mode(self) -> Mode {
        match self {
            Self::Choice => Mode::Choice,
            Self::EnrollInput
            | Self::EnrollCamera { .. }
            | Self::EnrollSubmitting
            | Self::EnrollSuccess => Mode::Enroll,
            Self::LoginInput | Self::LoginScan | Self::LoginVerifying | Self::LoginResult { .. } => {
                Mode::Login
            }
        }
    }
}

/// Category of the most recent failure, for shells that need more than the
/// notice text (exit codes, styling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty identity on submit.
    Validation,
    /// Camera unavailable or not ready.
    Device,
    /// Enrollment submission rejected or failed.
    Enrollment,
    /// Verification request failed.
    Verification,
    /// Verification succeeded but the face did not match.
    NotRecognized,
}
