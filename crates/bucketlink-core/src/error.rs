// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Error types for Bucketlink with backend-compatible error codes.

use thiserror::Error;

use crate::replication::ReplicationConfigError;

/// A specialized `Result` type for Bucketlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes reported by the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request was malformed or carried invalid parameters.
    BadRequest,
    /// The credentials are not allowed to perform the operation.
    Unauthorized,
    /// The auth token is not valid.
    BadAuthToken,
    /// The auth token has expired.
    ExpiredAuthToken,
    /// The key lacks the capability required for the operation.
    AccessDenied,
    /// The requested bucket or key does not exist.
    NotFound,
    /// The resource changed since it was read.
    Conflict,
    /// The account is being rate limited.
    TooManyRequests,
    /// Internal server error.
    InternalError,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorCode {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized | Self::BadAuthToken | Self::ExpiredAuthToken => 401,
            Self::AccessDenied => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::TooManyRequests => 429,
            Self::InternalError => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    /// Returns the wire code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::BadAuthToken => "bad_auth_token",
            Self::ExpiredAuthToken => "expired_auth_token",
            Self::AccessDenied => "access_denied",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::TooManyRequests => "too_many_requests",
            Self::InternalError => "internal_error",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }

    /// Parse from the wire code string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bad_request" => Some(Self::BadRequest),
            "unauthorized" => Some(Self::Unauthorized),
            "bad_auth_token" => Some(Self::BadAuthToken),
            "expired_auth_token" => Some(Self::ExpiredAuthToken),
            "access_denied" => Some(Self::AccessDenied),
            "not_found" => Some(Self::NotFound),
            "conflict" => Some(Self::Conflict),
            "too_many_requests" => Some(Self::TooManyRequests),
            "internal_error" => Some(Self::InternalError),
            "service_unavailable" => Some(Self::ServiceUnavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during Bucketlink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An error reported by the storage backend.
    #[error("{code}: {message}")]
    Api {
        /// The backend error code.
        code: ErrorCode,
        /// A human-readable error message.
        message: String,
        /// The resource that caused the error (bucket name, key id, etc.).
        resource: Option<String>,
    },

    /// A conditional bucket update was rejected because the bucket changed.
    #[error("bucket {bucket} was modified concurrently: expected revision {expected}, found {actual}")]
    RevisionMismatch {
        /// The bucket id.
        bucket: String,
        /// The revision the caller last observed.
        expected: u64,
        /// The revision currently stored.
        actual: u64,
    },

    /// A replication rule or configuration failed validation.
    #[error("invalid replication configuration: {0}")]
    InvalidReplication(#[from] ReplicationConfigError),

    /// Network or protocol failure talking to the backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new backend error.
    #[must_use]
    pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api { code, message: message.into(), resource: None }
    }

    /// Creates a new backend error with a resource.
    #[must_use]
    pub fn api_with_resource(
        code: ErrorCode,
        message: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self::Api { code, message: message.into(), resource: Some(resource.into()) }
    }

    /// Returns the backend error code that best describes this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Api { code, .. } => *code,
            Self::RevisionMismatch { .. } => ErrorCode::Conflict,
            Self::InvalidReplication(_) | Self::Config(_) => ErrorCode::BadRequest,
            Self::Transport(_) => ErrorCode::ServiceUnavailable,
            Self::Io(_) | Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    /// Returns true if the failure was caused by a concurrent modification.
    ///
    /// Callers should re-read the bucket and retry.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.code(), ErrorCode::Conflict)
    }
}
