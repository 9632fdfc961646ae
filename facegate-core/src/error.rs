use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacegateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Session controller is no longer running")]
    SessionClosed,

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, FacegateError>;

/// Failure to open or read the capture device.
///
/// Always recoverable: the controller surfaces it as a transient notice and
/// leaves the flow in its input step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Unable to access camera. Please check permissions.")]
    PermissionDenied,

    #[error("No camera device available.")]
    NoDevice,

    #[error("Camera stream failed: {0}")]
    Stream(String),
}

/// Failure of an enrollment submission.
///
/// `Display` yields only the human-readable reason so it can be shown as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrollError {
    /// The service answered but refused the enrollment.
    #[error("{reason}")]
    Rejected { status: Option<u16>, reason: String },

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),
}

impl EnrollError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Rejected { reason, .. } => reason,
            Self::Transport(reason) | Self::InvalidResponse(reason) => reason,
        }
    }
}

/// Failure of a verification submission.
///
/// A successful response reporting a non-match is not an error; it is a
/// [`VerificationOutcome`](crate::client::VerificationOutcome) with
/// `matched == false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("{reason}")]
    Rejected { status: Option<u16>, reason: String },

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),
}

impl VerifyError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Rejected { reason, .. } => reason,
            Self::Transport(reason) | Self::InvalidResponse(reason) => reason,
        }
    }
}
