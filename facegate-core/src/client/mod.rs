//! Verification service clients.
//!
//! The remote biometric service is reached through exactly two operations,
//! [`VerificationService::enroll`] and [`VerificationService::verify`]. Every
//! failure source (transport, HTTP status, malformed body) is normalized here
//! into [`EnrollError`] or [`VerifyError`], so the session controller only
//! ever sees typed outcomes.
//!
//! Both operations are single-shot: there is no retry or deduplication layer.
//! Callers must not issue concurrent duplicate submissions.

#[cfg(feature = "network")]
mod http;
mod mock;

#[cfg(feature = "network")]
pub use http::HttpVerificationClient;
pub use mock::{MockVerificationService, RecordedCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::encoder::EncodedImage;
use crate::error::{EnrollError, VerifyError};
use crate::session::Identity;

/// Number of images an enrollment submission carries.
pub const ENROLL_IMAGE_COUNT: usize = 3;

/// Result of a completed verification request.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    /// Identity the image was checked against.
    pub identity: Identity,
    pub matched: bool,
    /// Similarity score reported by the service, when present.
    pub similarity: Option<f64>,
}

/// Trait for the remote biometric service.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Register a face profile for `identity` from exactly three images.
    async fn enroll(
        &self,
        identity: &Identity,
        images: &[EncodedImage; ENROLL_IMAGE_COUNT],
    ) -> Result<(), EnrollError>;

    /// Check one image against the stored profile of `identity`.
    async fn verify(
        &self,
        identity: &Identity,
        image: &EncodedImage,
    ) -> Result<VerificationOutcome, VerifyError>;
}

/// Body of `POST /api/enroll`.
#[derive(Debug, Serialize)]
pub(crate) struct EnrollRequest<'a> {
    pub user_id: &'a str,
    pub images: &'a [EncodedImage],
}

/// Body of `POST /api/verify`.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub user_id: &'a str,
    pub image: &'a EncodedImage,
}

/// Response of `POST /api/enroll`, success or failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EnrollResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    /// Identity the server stored the enrollment under.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Successful response of `POST /api/verify`.
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// Extract a human-readable reason from a `detail` field.
///
/// Only plain strings are shown; structured validation errors fall back to
/// the caller's generic message.
pub(crate) fn detail_reason(detail: Option<&serde_json::Value>) -> Option<String> {
    detail
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_reason_uses_strings_only() {
        assert_eq!(
            detail_reason(Some(&json!("duplicate id"))),
            Some("duplicate id".to_string())
        );
        assert_eq!(detail_reason(Some(&json!("  "))), None);
        assert_eq!(
            detail_reason(Some(&json!([{"loc": ["body", "images"], "msg": "field required"}]))),
            None
        );
        assert_eq!(detail_reason(None), None);
    }

    #[test]
    fn test_verify_response_field_names() {
        let parsed: VerifyResponse =
            serde_json::from_value(json!({"ok": true, "match": true, "similarity": 0.61})).unwrap();
        assert!(parsed.matched);
        assert_eq!(parsed.similarity, Some(0.61));

        let parsed: VerifyResponse = serde_json::from_value(json!({"match": false})).unwrap();
        assert!(!parsed.matched);
        assert_eq!(parsed.similarity, None);
    }

    #[test]
    fn test_enroll_response_fields() {
        let parsed: EnrollResponse =
            serde_json::from_value(json!({"ok": true, "user_id": "alice"})).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.user_id.as_deref(), Some("alice"));

        let parsed: EnrollResponse =
            serde_json::from_value(json!({"detail": "User already enrolled"})).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.user_id, None);
    }

    #[test]
    fn test_enroll_request_wire_format() {
        let images: Vec<EncodedImage> = Vec::new();
        let body = serde_json::to_value(EnrollRequest {
            user_id: "alice",
            images: &images,
        })
        .unwrap();
        assert_eq!(body, json!({"user_id": "alice", "images": []}));
    }
}
