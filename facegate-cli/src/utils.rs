//! Common utility functions shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use facegate_core::{
    ClientConfig, DirectoryCamera, FailureKind, HttpVerificationClient, ImageEncoder,
    SessionBuilder, SessionHandle, SessionSnapshot,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

/// A flow that ended with a notice instead of a result.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FlowFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FlowFailure {
    /// The failure recorded in `snapshot`, if any.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Option<Self> {
        let kind = snapshot.last_failure?;
        let message = snapshot
            .notice
            .as_ref()
            .map(|notice| notice.message.clone())
            .unwrap_or_else(|| format!("{kind:?} failure"));
        Some(Self { kind, message })
    }
}

/// Resolve the service configuration: `--api-url` first, then the environment.
pub fn client_config(api_url: Option<String>) -> Result<ClientConfig> {
    let config = match api_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };
    config.context("Invalid verification service configuration")
}

/// A session controller running against a frames directory and the HTTP service.
pub struct CliSession {
    pub handle: SessionHandle,
    pub service_url: String,
    task: JoinHandle<()>,
}

impl CliSession {
    pub fn start(frames: &Path, quality: u8, api_url: Option<String>) -> Result<Self> {
        let config = client_config(api_url)?;
        let service_url = config.base_url().to_string();
        let service = HttpVerificationClient::with_config(config)
            .context("Failed to create verification client")?;
        debug!(service = %service_url, frames = %frames.display(), "Starting session");

        let (task, handle) = SessionBuilder::new(
            Arc::new(DirectoryCamera::new(frames)),
            Arc::new(service),
        )
        .encoder(ImageEncoder::with_quality(quality))
        .spawn();

        Ok(Self {
            handle,
            service_url,
            task,
        })
    }

    /// Wait until `done` holds, failing as soon as the session reports a failure.
    pub async fn wait<F>(&self, mut done: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let snapshot = self
            .handle
            .wait_for(|s| s.last_failure.is_some() || done(s))
            .await?;

        match FlowFailure::from_snapshot(&snapshot) {
            Some(failure) => Err(failure.into()),
            None => Ok(snapshot),
        }
    }

    /// Stop the controller and wait for it to release the camera.
    pub async fn close(self) -> Result<()> {
        // Already stopped if the command channel is closed.
        let _ = self.handle.shutdown();
        self.task.await.context("Session controller panicked")
    }
}
