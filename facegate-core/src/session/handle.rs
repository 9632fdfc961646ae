//! The shell-facing side of a running session: commands in, snapshots out.

use tokio::sync::{mpsc, watch};

use super::state::{AttemptToken, FailureKind, Identity, Phase};
use crate::auth::AuthSignal;
use crate::error::{FacegateError, Result};

/// User actions accepted by the session controller.
///
/// Commands that are not valid in the current step are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Choice -> Enroll.Input
    ChooseEnroll,
    /// Choice -> Login.Input
    ChooseLogin,
    /// Replace the identity being typed. Only accepted in an input step.
    SetIdentity(String),
    /// Confirm the identity and open the camera.
    Submit,
    /// Take one enrollment image.
    Capture,
    /// Abandon the current flow and return to the mode choice.
    Back,
    /// Enroll.Success -> Choice
    ContinueToLogin,
    /// Login.Result (no match) -> Choice without waiting for the auto-reset.
    TryAgain,
    /// Drop the authenticated state and reset everything.
    Logout,
    /// Release all resources and stop the controller.
    Shutdown,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: FailureKind,
}

/// Everything a shell may render about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    /// Raw text of the identity field.
    pub identity_input: String,
    /// Identity locked in for the running flow.
    pub identity: Option<Identity>,
    /// Currently visible transient notice.
    pub notice: Option<Notice>,
    /// Most recent failure since a mode was last chosen. Outlives the notice.
    pub last_failure: Option<FailureKind>,
    /// Similarity score of the last verification, if reported.
    pub similarity: Option<f64>,
    pub camera_open: bool,
    pub authenticated: bool,
    pub attempt: AttemptToken,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Choice,
            identity_input: String::new(),
            identity: None,
            notice: None,
            last_failure: None,
            similarity: None,
            camera_open: false,
            authenticated: false,
            attempt: AttemptToken::default(),
        }
    }
}

/// Cloneable handle to a running [`SessionController`](super::SessionController).
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    auth: watch::Receiver<AuthSignal>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        snapshots: watch::Receiver<SessionSnapshot>,
        auth: watch::Receiver<AuthSignal>,
    ) -> Self {
        Self {
            commands,
            snapshots,
            auth,
        }
    }

    /// Queue a command for the controller.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| FacegateError::SessionClosed)
    }

    pub fn choose_enroll(&self) -> Result<()> {
        self.send(Command::ChooseEnroll)
    }

    pub fn choose_login(&self) -> Result<()> {
        self.send(Command::ChooseLogin)
    }

    pub fn set_identity(&self, identity: impl Into<String>) -> Result<()> {
        self.send(Command::SetIdentity(identity.into()))
    }

    pub fn submit(&self) -> Result<()> {
        self.send(Command::Submit)
    }

    pub fn capture(&self) -> Result<()> {
        self.send(Command::Capture)
    }

    pub fn back(&self) -> Result<()> {
        self.send(Command::Back)
    }

    pub fn logout(&self) -> Result<()> {
        self.send(Command::Logout)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// The authenticated signal consumed by the shell.
    pub fn auth_signal(&self) -> watch::Receiver<AuthSignal> {
        self.auth.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| FacegateError::SessionClosed)?;
        Ok(snapshot.clone())
    }
}
