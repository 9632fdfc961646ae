//! Scripted verification service for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{VerificationOutcome, VerificationService, ENROLL_IMAGE_COUNT};
use crate::encoder::EncodedImage;
use crate::error::{EnrollError, VerifyError};
use crate::session::Identity;

/// A call received by [`MockVerificationService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Enroll { identity: String, images: usize },
    Verify { identity: String },
}

/// Scripted verify reply: `Ok((matched, similarity))` or an error.
type VerifyReply = Result<(bool, Option<f64>), VerifyError>;

#[derive(Default)]
struct Script {
    enroll: VecDeque<Result<(), EnrollError>>,
    verify: VecDeque<VerifyReply>,
    calls: Vec<RecordedCall>,
}

/// In-memory [`VerificationService`] with queued replies.
///
/// When a queue is empty, enrollment succeeds and verification matches.
#[derive(Clone, Default)]
pub struct MockVerificationService {
    script: Arc<Mutex<Script>>,
    latency: Duration,
}

impl MockVerificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `latency` (virtual time under a paused runtime).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push_enroll(&self, reply: Result<(), EnrollError>) -> &Self {
        self.lock().enroll.push_back(reply);
        self
    }

    pub fn push_verify_match(&self, matched: bool) -> &Self {
        self.lock().verify.push_back(Ok((matched, None)));
        self
    }

    /// Queue a verify reply that also reports a similarity score.
    pub fn push_verify_score(&self, matched: bool, similarity: f64) -> &Self {
        self.lock().verify.push_back(Ok((matched, Some(similarity))));
        self
    }

    pub fn push_verify_error(&self, error: VerifyError) -> &Self {
        self.lock().verify.push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl VerificationService for MockVerificationService {
    async fn enroll(
        &self,
        identity: &Identity,
        images: &[EncodedImage; ENROLL_IMAGE_COUNT],
    ) -> Result<(), EnrollError> {
        let reply = {
            let mut script = self.lock();
            script.calls.push(RecordedCall::Enroll {
                identity: identity.as_str().to_string(),
                images: images.len(),
            });
            script.enroll.pop_front().unwrap_or(Ok(()))
        };
        self.simulate_latency().await;
        reply
    }

    async fn verify(
        &self,
        identity: &Identity,
        _image: &EncodedImage,
    ) -> Result<VerificationOutcome, VerifyError> {
        let reply = {
            let mut script = self.lock();
            script.calls.push(RecordedCall::Verify {
                identity: identity.as_str().to_string(),
            });
            script.verify.pop_front().unwrap_or(Ok((true, None)))
        };
        self.simulate_latency().await;

        reply.map(|(matched, similarity)| VerificationOutcome {
            identity: identity.clone(),
            matched,
            similarity,
        })
    }
}
