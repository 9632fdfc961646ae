//! HTTP client for the remote biometric service.
//!
//! ## Endpoints
//!
//! - `POST {base}/api/enroll` with `{ user_id, images: [3] }`, expects `{ ok: true }`
//! - `POST {base}/api/verify` with `{ user_id, image }`, expects `{ match: bool }`
//!
//! Requests are sent once. A failed attempt is terminal for the flow that
//! issued it.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use super::{
    detail_reason, EnrollRequest, EnrollResponse, ErrorBody, VerificationOutcome,
    VerificationService, VerifyRequest, VerifyResponse, ENROLL_IMAGE_COUNT,
};
use crate::config::ClientConfig;
use crate::encoder::EncodedImage;
use crate::error::{EnrollError, FacegateError, Result, VerifyError};
use crate::session::Identity;

/// Reason shown when an enrollment fails without a server explanation.
const ENROLL_FALLBACK_REASON: &str = "Enrollment failed";

/// Reason shown when a verification fails without a server explanation.
const VERIFY_FALLBACK_REASON: &str = "Login failed";

/// reqwest-backed [`VerificationService`].
pub struct HttpVerificationClient {
    client: Client,
    config: ClientConfig,
}

impl HttpVerificationClient {
    /// Create a client with configuration from the environment.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client with explicit configuration.
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url(),
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                FacegateError::Config(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!("Verification client created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl VerificationService for HttpVerificationClient {
    #[instrument(level = "info", skip(self, images), fields(identity = %identity))]
    async fn enroll(
        &self,
        identity: &Identity,
        images: &[EncodedImage; ENROLL_IMAGE_COUNT],
    ) -> std::result::Result<(), EnrollError> {
        let start = Instant::now();
        let url = self.config.endpoint("enroll");
        let body = EnrollRequest {
            user_id: identity.as_str(),
            images: images.as_slice(),
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            warn!(error = %e, "Enrollment request failed");
            EnrollError::Transport(transport_reason(&e))
        })?;

        let status = response.status();
        let text = read_body(response).await;
        let parsed: Option<EnrollResponse> = serde_json::from_str(&text).ok();
        let latency_ms = start.elapsed().as_millis() as u64;

        match parsed {
            Some(body) if status.is_success() && body.ok => {
                info!(latency_ms, user_id = ?body.user_id, "Enrollment accepted");
                Ok(())
            }
            Some(body) => {
                let reason = detail_reason(body.detail.as_ref())
                    .unwrap_or_else(|| ENROLL_FALLBACK_REASON.to_string());
                warn!(status = %status, latency_ms, reason = %reason, "Enrollment rejected");
                Err(EnrollError::Rejected {
                    status: Some(status.as_u16()),
                    reason,
                })
            }
            None if status.is_success() => {
                warn!(status = %status, latency_ms, "Unreadable enrollment response");
                Err(EnrollError::InvalidResponse(ENROLL_FALLBACK_REASON.to_string()))
            }
            None => {
                warn!(status = %status, latency_ms, "Enrollment rejected without body");
                Err(EnrollError::Rejected {
                    status: Some(status.as_u16()),
                    reason: ENROLL_FALLBACK_REASON.to_string(),
                })
            }
        }
    }

    #[instrument(level = "info", skip(self, image), fields(identity = %identity))]
    async fn verify(
        &self,
        identity: &Identity,
        image: &EncodedImage,
    ) -> std::result::Result<VerificationOutcome, VerifyError> {
        let start = Instant::now();
        let url = self.config.endpoint("verify");
        let body = VerifyRequest {
            user_id: identity.as_str(),
            image,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            warn!(error = %e, "Verification request failed");
            VerifyError::Transport(transport_reason(&e))
        })?;

        let status = response.status();
        let text = read_body(response).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| detail_reason(body.detail.as_ref()))
                .unwrap_or_else(|| VERIFY_FALLBACK_REASON.to_string());
            warn!(status = %status, latency_ms, reason = %reason, "Verification rejected");
            return Err(VerifyError::Rejected {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let parsed: VerifyResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, latency_ms, "Failed to parse verification response");
            VerifyError::InvalidResponse(format!("Invalid verification response: {e}"))
        })?;

        info!(
            matched = parsed.matched,
            similarity = ?parsed.similarity,
            latency_ms,
            "Verification completed"
        );

        Ok(VerificationOutcome {
            identity: identity.clone(),
            matched: parsed.matched,
            similarity: parsed.similarity,
        })
    }
}

async fn read_body(response: Response) -> String {
    response.text().await.unwrap_or_else(|e| {
        debug!(error = %e, "Failed to read response body");
        String::new()
    })
}

fn transport_reason(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "The verification service did not respond in time".to_string()
    } else if error.is_connect() {
        "Unable to reach the verification service".to_string()
    } else {
        format!("Request failed: {error}")
    }
}
