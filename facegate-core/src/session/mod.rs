//! Enrollment and login session control.

mod controller;
mod handle;
mod state;
mod timers;

pub use controller::{SessionBuilder, SessionController};
pub use handle::{Command, Notice, SessionHandle, SessionSnapshot};
pub use state::{AttemptToken, EnrollStep, FailureKind, FlowState, Identity, LoginStep, Mode, Phase};
