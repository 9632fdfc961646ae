//! The session flow controller.
//!
//! One task owns all session state and processes, one at a time, user
//! commands and internal events (timer expiries, request completions). Every
//! internal event carries the [`AttemptToken`] it was created under; events
//! from an attempt that has since been reset are dropped on arrival.
//!
//! ```text
//! Choice ──▶ Enroll.Input ──submit──▶ Enroll.Camera ──3rd capture──▶ Enroll.Submitting ──ok──▶ Enroll.Success
//!    │                                                                      └──err──▶ Choice
//!    └─────▶ Login.Input ──submit──▶ Login.Scan ──2s──▶ Login.Verifying ──match──▶ Login.Result ──2s──▶ authenticated
//!                                                            │         └─no match─▶ Login.Result ──3s──▶ Choice
//!                                                            └──err──▶ Choice
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::handle::{Command, Notice, SessionHandle, SessionSnapshot};
use super::state::{AttemptToken, EnrollStep, FailureKind, FlowState, Identity, LoginStep};
use super::timers::DelayedTasks;
use crate::auth::{AuthBoundary, AuthObserver, NoopObserver};
use crate::capture::{self, CameraSession, CaptureDevice};
use crate::client::{VerificationOutcome, VerificationService, ENROLL_IMAGE_COUNT};
use crate::config::FlowTimings;
use crate::encoder::{EncodedImage, ImageEncoder};
use crate::error::{EnrollError, VerifyError};

const ENROLL_IDENTITY_REQUIRED: &str = "Please enter a User ID";
const LOGIN_IDENTITY_REQUIRED: &str = "Please enter your User ID";
const CAMERA_NOT_READY: &str = "Camera is not ready yet. Please try again.";
const CAPTURE_FAILED: &str = "Unable to capture an image from the camera.";
const NOT_RECOGNIZED: &str = "Face not recognized. Please try again.";

/// Events produced by the controller's own tasks.
#[derive(Debug)]
enum Internal {
    ScanDue {
        attempt: AttemptToken,
    },
    UnlockDue {
        attempt: AttemptToken,
    },
    FailureResetDue {
        attempt: AttemptToken,
    },
    NoticeExpired {
        seq: u64,
    },
    EnrollCompleted {
        attempt: AttemptToken,
        result: Result<(), EnrollError>,
    },
    VerifyCompleted {
        attempt: AttemptToken,
        result: Result<VerificationOutcome, VerifyError>,
    },
}

/// Builder for a [`SessionController`] and its [`SessionHandle`].
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use facegate_core::{DirectoryCamera, HttpVerificationClient, SessionBuilder};
///
/// # async fn example() -> facegate_core::Result<()> {
/// let camera = Arc::new(DirectoryCamera::new("frames"));
/// let service = Arc::new(HttpVerificationClient::new()?);
///
/// let (_task, session) = SessionBuilder::new(camera, service)
///     .observer(Arc::new(|identity: &facegate_core::Identity| {
///         println!("unlocked for {identity}");
///     }))
///     .spawn();
///
/// session.choose_login()?;
/// session.set_identity("alice")?;
/// session.submit()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    device: Arc<dyn CaptureDevice>,
    service: Arc<dyn VerificationService>,
    observer: Arc<dyn AuthObserver>,
    timings: FlowTimings,
    encoder: ImageEncoder,
}

impl SessionBuilder {
    pub fn new(device: Arc<dyn CaptureDevice>, service: Arc<dyn VerificationService>) -> Self {
        Self {
            device,
            service,
            observer: Arc::new(NoopObserver),
            timings: FlowTimings::default(),
            encoder: ImageEncoder::default(),
        }
    }

    /// Callback invoked when a verification unlocks the session.
    pub fn observer(mut self, observer: Arc<dyn AuthObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn timings(mut self, timings: FlowTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn encoder(mut self, encoder: ImageEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn build(self) -> (SessionController, SessionHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(SessionSnapshot::default());
        let auth = AuthBoundary::new(self.observer);

        let handle = SessionHandle::new(commands_tx, snapshots_rx, auth.subscribe());
        let controller = SessionController {
            device: self.device,
            service: self.service,
            encoder: self.encoder,
            timings: self.timings,
            auth,
            state: FlowState::Choice,
            identity_input: String::new(),
            camera: None,
            attempt: AttemptToken::default(),
            attempt_tasks: DelayedTasks::new(),
            notice: None,
            notice_seq: 0,
            notice_task: DelayedTasks::new(),
            last_failure: None,
            similarity: None,
            commands,
            internal_tx,
            internal_rx,
            snapshots,
        };

        (controller, handle)
    }

    /// Build and run the controller on the current tokio runtime.
    pub fn spawn(self) -> (JoinHandle<()>, SessionHandle) {
        let (controller, handle) = self.build();
        (tokio::spawn(controller.run()), handle)
    }
}

/// Drives the enrollment and login flows.
pub struct SessionController {
    device: Arc<dyn CaptureDevice>,
    service: Arc<dyn VerificationService>,
    encoder: ImageEncoder,
    timings: FlowTimings,
    auth: AuthBoundary,

    state: FlowState,
    identity_input: String,
    camera: Option<CameraSession>,
    attempt: AttemptToken,
    /// Delays and requests belonging to the current attempt.
    attempt_tasks: DelayedTasks,

    notice: Option<Notice>,
    notice_seq: u64,
    notice_task: DelayedTasks,
    last_failure: Option<FailureKind>,
    similarity: Option<f64>,

    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Process events until [`Command::Shutdown`] or until every handle is dropped.
    pub async fn run(mut self) {
        info!(device = self.device.name(), "Session controller started");
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.internal_rx.recv() => self.handle_internal(event),
            }
            self.publish();
        }

        self.reset();
        self.notice_task.cancel_all();
        self.publish();
        info!("Session controller stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        if self.auth.is_authenticated() && command != Command::Logout {
            debug!(?command, "Ignored while authenticated");
            return;
        }

        match command {
            Command::ChooseEnroll => self.choose(FlowState::Enroll(EnrollStep::Input)),
            Command::ChooseLogin => self.choose(FlowState::Login(LoginStep::Input)),
            Command::SetIdentity(text) => self.set_identity(text),
            Command::Submit => self.submit().await,
            Command::Capture => self.capture(),
            Command::Back => {
                debug!(phase = ?self.state.phase(), "Back");
                self.reset();
            }
            Command::ContinueToLogin => {
                if matches!(self.state, FlowState::Enroll(EnrollStep::Success { .. })) {
                    self.reset();
                }
            }
            Command::TryAgain => {
                if matches!(&self.state, FlowState::Login(LoginStep::Result { outcome }) if !outcome.matched)
                {
                    self.reset();
                }
            }
            Command::Logout => self.logout(),
            Command::Shutdown => {}
        }
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::NoticeExpired { seq } => {
                if seq == self.notice_seq {
                    self.notice = None;
                }
            }
            Internal::ScanDue { attempt } => {
                if self.is_current(attempt) {
                    self.perform_scan();
                }
            }
            Internal::UnlockDue { attempt } => {
                if self.is_current(attempt) {
                    self.unlock();
                }
            }
            Internal::FailureResetDue { attempt } => {
                if self.is_current(attempt)
                    && matches!(&self.state, FlowState::Login(LoginStep::Result { outcome }) if !outcome.matched)
                {
                    self.reset();
                }
            }
            Internal::EnrollCompleted { attempt, result } => {
                if self.is_current(attempt) {
                    self.finish_enrollment(result);
                }
            }
            Internal::VerifyCompleted { attempt, result } => {
                if self.is_current(attempt) {
                    self.finish_verification(result);
                }
            }
        }
    }

    fn is_current(&self, attempt: AttemptToken) -> bool {
        if attempt != self.attempt {
            debug!(stale = %attempt, current = %self.attempt, "Discarding event from a previous attempt");
            return false;
        }
        true
    }

    fn choose(&mut self, next: FlowState) {
        if !matches!(self.state, FlowState::Choice) {
            debug!(phase = ?self.state.phase(), "Mode already chosen");
            return;
        }
        self.identity_input.clear();
        self.last_failure = None;
        self.similarity = None;
        self.state = next;
        debug!(mode = ?self.state.mode(), attempt = %self.attempt, "Mode chosen");
    }

    fn set_identity(&mut self, text: String) {
        if self.state.is_input() {
            self.identity_input = text;
        } else {
            debug!(phase = ?self.state.phase(), "Identity is locked for the running flow");
        }
    }

    async fn submit(&mut self) {
        let enrolling = match self.state {
            FlowState::Enroll(EnrollStep::Input) => true,
            FlowState::Login(LoginStep::Input) => false,
            _ => {
                debug!(phase = ?self.state.phase(), "Submit ignored outside an input step");
                return;
            }
        };

        let Some(identity) = Identity::parse(&self.identity_input) else {
            let message = if enrolling {
                ENROLL_IDENTITY_REQUIRED
            } else {
                LOGIN_IDENTITY_REQUIRED
            };
            self.show_notice(FailureKind::Validation, message);
            return;
        };

        capture::release(&mut self.camera);
        match self.device.acquire().await {
            Ok(session) => self.camera = Some(session),
            Err(e) => {
                warn!(error = %e, device = self.device.name(), "Camera acquisition failed");
                self.show_notice(FailureKind::Device, e.to_string());
                return;
            }
        }

        info!(identity = %identity, attempt = %self.attempt, enrolling, "Camera opened");
        if enrolling {
            self.state = FlowState::Enroll(EnrollStep::Camera {
                identity,
                captured: Vec::with_capacity(ENROLL_IMAGE_COUNT),
            });
        } else {
            self.state = FlowState::Login(LoginStep::Scan { identity });
            self.attempt_tasks.schedule(
                self.timings.scan_delay,
                &self.internal_tx,
                Internal::ScanDue {
                    attempt: self.attempt,
                },
            );
        }
    }

    /// Snapshot and encode the current camera frame.
    fn grab_image(&mut self) -> Result<EncodedImage, &'static str> {
        let frame = self
            .camera
            .as_mut()
            .and_then(CameraSession::snapshot)
            .ok_or(CAMERA_NOT_READY)?;

        self.encoder.encode(&frame).map_err(|e| {
            warn!(error = %e, "Failed to encode frame");
            CAPTURE_FAILED
        })
    }

    fn capture(&mut self) {
        if !matches!(self.state, FlowState::Enroll(EnrollStep::Camera { .. })) {
            debug!(phase = ?self.state.phase(), "Capture ignored");
            return;
        }

        let image = match self.grab_image() {
            Ok(image) => image,
            Err(message) => {
                self.show_notice(FailureKind::Device, message);
                return;
            }
        };

        let count = match &mut self.state {
            FlowState::Enroll(EnrollStep::Camera { captured, .. }) => {
                captured.push(image);
                captured.len()
            }
            _ => return,
        };
        info!(captured = count, required = ENROLL_IMAGE_COUNT, "Enrollment image captured");

        if count == ENROLL_IMAGE_COUNT {
            self.submit_enrollment();
        }
    }

    fn submit_enrollment(&mut self) {
        capture::release(&mut self.camera);

        let FlowState::Enroll(EnrollStep::Camera { identity, captured }) =
            std::mem::take(&mut self.state)
        else {
            return;
        };

        let images: [EncodedImage; ENROLL_IMAGE_COUNT] = match captured.try_into() {
            Ok(images) => images,
            Err(captured) => {
                error!(count = captured.len(), "Enrollment needs exactly three images");
                self.show_notice(FailureKind::Enrollment, "Enrollment failed");
                self.reset();
                return;
            }
        };

        info!(identity = %identity, attempt = %self.attempt, "Submitting enrollment");
        self.state = FlowState::Enroll(EnrollStep::Submitting {
            identity: identity.clone(),
        });

        let service = Arc::clone(&self.service);
        let tx = self.internal_tx.clone();
        let attempt = self.attempt;
        self.attempt_tasks.spawn(async move {
            let result = service.enroll(&identity, &images).await;
            let _ = tx.send(Internal::EnrollCompleted { attempt, result });
        });
    }

    fn finish_enrollment(&mut self, result: Result<(), EnrollError>) {
        let FlowState::Enroll(EnrollStep::Submitting { identity }) = std::mem::take(&mut self.state)
        else {
            warn!("Enrollment result arrived outside submission");
            return;
        };

        match result {
            Ok(()) => {
                info!(identity = %identity, "Enrollment succeeded");
                self.state = FlowState::Enroll(EnrollStep::Success { identity });
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "Enrollment failed");
                self.show_notice(FailureKind::Enrollment, e.reason());
                self.reset();
            }
        }
    }

    fn perform_scan(&mut self) {
        if !matches!(self.state, FlowState::Login(LoginStep::Scan { .. })) {
            return;
        }

        let image = self.grab_image();
        capture::release(&mut self.camera);

        let image = match image {
            Ok(image) => image,
            Err(_) => {
                warn!("Automatic capture produced no frame");
                self.show_notice(FailureKind::Device, CAPTURE_FAILED);
                self.reset();
                return;
            }
        };

        let FlowState::Login(LoginStep::Scan { identity }) = std::mem::take(&mut self.state) else {
            return;
        };

        info!(identity = %identity, attempt = %self.attempt, "Submitting verification");
        self.state = FlowState::Login(LoginStep::Verifying {
            identity: identity.clone(),
        });

        let service = Arc::clone(&self.service);
        let tx = self.internal_tx.clone();
        let attempt = self.attempt;
        self.attempt_tasks.spawn(async move {
            let result = service.verify(&identity, &image).await;
            let _ = tx.send(Internal::VerifyCompleted { attempt, result });
        });
    }

    fn finish_verification(&mut self, result: Result<VerificationOutcome, VerifyError>) {
        let FlowState::Login(LoginStep::Verifying { identity }) = std::mem::take(&mut self.state)
        else {
            warn!("Verification result arrived outside verification");
            return;
        };

        let outcome = match result {
            Ok(outcome) => VerificationOutcome {
                identity,
                ..outcome
            },
            Err(e) => {
                warn!(identity = %identity, error = %e, "Verification failed");
                self.show_notice(FailureKind::Verification, e.reason());
                self.reset();
                return;
            }
        };

        self.similarity = outcome.similarity;
        let attempt = self.attempt;
        if outcome.matched {
            info!(identity = %outcome.identity, "Face matched");
            self.attempt_tasks.schedule(
                self.timings.unlock_delay,
                &self.internal_tx,
                Internal::UnlockDue { attempt },
            );
        } else {
            info!(identity = %outcome.identity, "Face not recognized");
            self.show_notice(FailureKind::NotRecognized, NOT_RECOGNIZED);
            self.attempt_tasks.schedule(
                self.timings.failure_reset_delay,
                &self.internal_tx,
                Internal::FailureResetDue { attempt },
            );
        }
        self.state = FlowState::Login(LoginStep::Result { outcome });
    }

    fn unlock(&mut self) {
        match &self.state {
            FlowState::Login(LoginStep::Result { outcome }) if outcome.matched => {
                self.auth.grant(&outcome.identity);
            }
            _ => debug!(phase = ?self.state.phase(), "Unlock no longer applicable"),
        }
    }

    fn logout(&mut self) {
        self.auth.revoke();
        self.reset();
        self.clear_notice();
        self.last_failure = None;
    }

    /// Return to the mode choice, releasing the camera and aborting every
    /// pending delay and request of the current attempt. Idempotent.
    fn reset(&mut self) {
        let cancelled = self.attempt_tasks.pending();
        capture::release(&mut self.camera);
        self.attempt_tasks.cancel_all();
        self.attempt = self.attempt.next();
        self.state = FlowState::Choice;
        self.identity_input.clear();
        self.similarity = None;
        debug!(attempt = %self.attempt, cancelled, "Session reset");
    }

    fn show_notice(&mut self, kind: FailureKind, message: impl Into<String>) {
        let message = message.into();
        info!(?kind, message = %message, "Notice");

        self.notice_seq += 1;
        self.notice = Some(Notice { message, kind });
        self.last_failure = Some(kind);

        self.notice_task.cancel_all();
        self.notice_task.schedule(
            self.timings.notice_lifetime,
            &self.internal_tx,
            Internal::NoticeExpired {
                seq: self.notice_seq,
            },
        );
    }

    fn clear_notice(&mut self) {
        self.notice_task.cancel_all();
        self.notice_seq += 1;
        self.notice = None;
    }

    fn publish(&self) {
        debug_assert_eq!(
            self.state.uses_camera(),
            self.camera.is_some(),
            "camera must be open exactly in the camera steps"
        );

        self.snapshots.send_replace(SessionSnapshot {
            phase: self.state.phase(),
            identity_input: self.identity_input.clone(),
            identity: self.state.identity().cloned(),
            notice: self.notice.clone(),
            last_failure: self.last_failure,
            similarity: self.similarity,
            camera_open: self.camera.as_ref().is_some_and(CameraSession::is_open),
            authenticated: self.auth.is_authenticated(),
            attempt: self.attempt,
        });
    }
}
