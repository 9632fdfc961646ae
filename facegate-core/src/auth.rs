//! Auth boundary between the lock screen and the shell behind it.
//!
//! The shell learns about authentication in exactly one way: an
//! [`AuthObserver`] callback carrying the verified identity, mirrored in an
//! [`AuthSignal`] watch channel. Nothing else about the session leaves the
//! controller.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::session::Identity;

/// Receives authentication events from the session controller.
pub trait AuthObserver: Send + Sync {
    /// Called once per confirmed face match, after the unlock delay.
    fn on_authenticated(&self, identity: &Identity);

    /// Called when the shell logs out and the lock screen is reset.
    fn on_logout(&self) {}
}

impl<F> AuthObserver for F
where
    F: Fn(&Identity) + Send + Sync,
{
    fn on_authenticated(&self, identity: &Identity) {
        self(identity)
    }
}

/// Observer that ignores every event. Useful when only the signal is needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AuthObserver for NoopObserver {
    fn on_authenticated(&self, _identity: &Identity) {}
}

/// The authenticated flag plus the identity that unlocked it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSignal {
    pub authenticated: bool,
    pub identity: Option<Identity>,
}

impl AuthSignal {
    fn granted(identity: Identity) -> Self {
        Self {
            authenticated: true,
            identity: Some(identity),
        }
    }
}

/// Owned by the controller; grants and revokes the authenticated signal.
pub(crate) struct AuthBoundary {
    observer: Arc<dyn AuthObserver>,
    signal: watch::Sender<AuthSignal>,
}

impl AuthBoundary {
    pub fn new(observer: Arc<dyn AuthObserver>) -> Self {
        let (signal, _) = watch::channel(AuthSignal::default());
        Self { observer, signal }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSignal> {
        self.signal.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.signal.borrow().authenticated
    }

    pub fn grant(&self, identity: &Identity) {
        info!(identity = %identity, "Authenticated");
        self.signal.send_replace(AuthSignal::granted(identity.clone()));
        self.observer.on_authenticated(identity);
    }

    /// Drop the authenticated state. Returns whether it was set.
    pub fn revoke(&self) -> bool {
        let previous = self.signal.send_replace(AuthSignal::default());
        if previous.authenticated {
            info!(identity = ?previous.identity.as_ref().map(Identity::as_str), "Logged out");
            self.observer.on_logout();
        }
        previous.authenticated
    }
}
