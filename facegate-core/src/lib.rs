//! Facegate Core - face-recognition lock screen session library
//!
//! This crate drives the client side of a biometric lock screen: an
//! enrollment flow that registers three face images under a user id, and a
//! login flow that captures one image and asks a remote service whether it
//! matches.
//!
//! # Features
//!
//! - Single-owner session controller with cancellable, attempt-scoped timers
//! - Camera sessions that are released on every exit path
//! - JPEG data-URI encoding of captured frames
//! - HTTP client for the `/api/enroll` and `/api/verify` endpoints
//! - Auth boundary exposing only an authenticated signal and identity
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use facegate_core::{MockCamera, MockVerificationService, Phase, SessionBuilder};
//!
//! # async fn example() -> facegate_core::Result<()> {
//! let camera = Arc::new(MockCamera::new());
//! let service = Arc::new(MockVerificationService::default());
//! let (_task, session) = SessionBuilder::new(camera, service).spawn();
//!
//! session.choose_enroll()?;
//! session.set_identity("alice")?;
//! session.submit()?;
//! for _ in 0..3 {
//!     session.capture()?;
//! }
//!
//! let done = session
//!     .wait_for(|s| s.phase == Phase::EnrollSuccess)
//!     .await?;
//! assert!(!done.camera_open);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod capture;
pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod session;

// Re-export main types for convenience
pub use auth::{AuthObserver, AuthSignal, NoopObserver};
pub use capture::{
    CameraSession, CameraStream, CaptureDevice, DirectoryCamera, MockCamera, MockCameraStats,
    RawFrame,
};
pub use client::{
    MockVerificationService, RecordedCall, VerificationOutcome, VerificationService,
    ENROLL_IMAGE_COUNT,
};
pub use config::{ClientConfig, FlowTimings, DEFAULT_API_BASE_URL};
pub use encoder::{EncodedImage, ImageEncoder, DEFAULT_JPEG_QUALITY, IMAGE_MIME};
pub use error::{DeviceError, EnrollError, FacegateError, Result, VerifyError};
pub use session::{
    AttemptToken, Command, FailureKind, Identity, Mode, Notice, Phase, SessionBuilder,
    SessionController, SessionHandle, SessionSnapshot,
};

// Network-dependent exports
#[cfg(feature = "network")]
pub use client::HttpVerificationClient;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Integration test: enroll three frames, then log in with the same identity.
    #[tokio::test(start_paused = true)]
    async fn test_enroll_then_login_workflow() {
        let camera = MockCamera::new();
        let service = MockVerificationService::default();
        let (task, session) =
            SessionBuilder::new(Arc::new(camera.clone()), Arc::new(service.clone())).spawn();

        // Step 1: enrollment
        session.choose_enroll().unwrap();
        session.set_identity("alice").unwrap();
        session.submit().unwrap();
        for _ in 0..ENROLL_IMAGE_COUNT {
            session.capture().unwrap();
        }
        session
            .wait_for(|s| s.phase == Phase::EnrollSuccess)
            .await
            .expect("Enrollment should succeed");
        session.send(Command::ContinueToLogin).unwrap();

        // Step 2: login
        session.choose_login().unwrap();
        session.set_identity("alice").unwrap();
        session.submit().unwrap();
        let unlocked = session
            .wait_for(|s| s.authenticated)
            .await
            .expect("Login should unlock");
        assert_eq!(unlocked.identity.as_ref().map(Identity::as_str), Some("alice"));

        // Step 3: every camera session was closed again
        let stats = camera.stats();
        assert_eq!(stats.acquisitions, 2);
        assert_eq!(stats.open_streams, 0);
        assert_eq!(service.calls().len(), 2);

        session.shutdown().unwrap();
        task.await.unwrap();
    }
}
