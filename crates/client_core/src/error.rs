use std::fmt;

use shared::{
    domain::ChatKind,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Input rejected locally, before anything reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email is required.")]
    EmailRequired,
    #[error("Password is required.")]
    PasswordRequired,
    #[error("Password and Confirm Password should be same.")]
    PasswordMismatch,
    #[error("First Name is Required.")]
    FirstNameRequired,
    #[error("Last Name is Required.")]
    LastNameRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailureKind {
    /// The request never produced an HTTP response.
    Network,
    /// 4xx: the server refused the request.
    Rejected(ErrorCode),
    /// 5xx or any other non-success status.
    Server,
    /// A success status whose body did not have the expected shape.
    Malformed,
}

impl fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("network error"),
            Self::Rejected(code) => write!(f, "rejected ({code:?})"),
            Self::Server => f.write_str("server error"),
            Self::Malformed => f.write_str("malformed response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint} failed: {kind}: {detail}")]
pub struct RemoteFailure {
    pub endpoint: &'static str,
    pub kind: RemoteFailureKind,
    pub status: Option<u16>,
    pub detail: String,
}

impl RemoteFailure {
    pub fn network(endpoint: &'static str, detail: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind: RemoteFailureKind::Network,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn malformed(endpoint: &'static str, detail: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind: RemoteFailureKind::Malformed,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn from_status(endpoint: &'static str, status: u16, body: &str) -> Self {
        let ApiError { code, message } = ApiError::from_status(status, body);
        let kind = if (400..500).contains(&status) {
            RemoteFailureKind::Rejected(code)
        } else {
            RemoteFailureKind::Server
        };
        Self {
            endpoint,
            kind,
            status: Some(status),
            detail: message,
        }
    }

    pub fn from_reqwest(endpoint: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::malformed(endpoint, err.to_string());
        }
        match err.status() {
            Some(status) => Self::from_status(endpoint, status.as_u16(), &err.to_string()),
            None => Self::network(endpoint, err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
    #[error("{kind} {id} is not present in the current collection")]
    NotFound { kind: ChatKind, id: String },
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("session changed while the request was in flight")]
    SessionSuperseded,
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn remote_kind(&self) -> Option<RemoteFailureKind> {
        match self {
            Self::Remote(failure) => Some(failure.kind),
            _ => None,
        }
    }
}
