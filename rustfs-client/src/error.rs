//! Error types for storage operations

use std::time::Duration;

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Underlying cause attached to a remote failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while configuring the client, presigning, or
/// talking to the storage service
#[derive(Error, Debug)]
pub enum StorageError {
    /// Client configuration was rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request parameters were rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Presign expiry is zero (or rounds down to zero seconds)
    #[error("Cannot presign {target}: expiry must be positive, got {expiry:?}")]
    InvalidExpiry {
        /// `bucket/key` being signed
        target: String,
        /// Expiry asked for by the caller
        expiry: Duration,
    },

    /// Presign expiry is longer than the signing window allows
    #[error("Cannot presign {target}: expiry {requested:?} exceeds the maximum of {max:?}")]
    ExpiryTooLong {
        /// `bucket/key` being signed
        target: String,
        /// Expiry asked for by the caller
        requested: Duration,
        /// Longest expiry that can be presigned
        max: Duration,
    },

    /// The HTTP method cannot be presigned
    #[error("Cannot presign {method} for {target}: {reason}")]
    UnsupportedOperation {
        /// `bucket/key` being signed
        target: String,
        /// Method asked for by the caller
        method: String,
        /// Why the method was refused
        reason: &'static str,
    },

    /// Signature computation failed
    #[error("Failed to sign request for {target}: {reason}")]
    SigningFailure {
        /// `bucket/key` being signed
        target: String,
        /// What went wrong
        reason: String,
    },

    /// Target bucket or object already exists
    #[error("{operation} failed: {target} already exists")]
    AlreadyExists {
        /// Operation that failed
        operation: &'static str,
        /// Bucket or `bucket/key`
        target: String,
        /// Service error, when the conflict was reported remotely
        #[source]
        source: Option<BoxError>,
    },

    /// Target bucket or object does not exist
    #[error("{operation} failed: {target} not found")]
    NotFound {
        /// Operation that failed
        operation: &'static str,
        /// Bucket or `bucket/key`
        target: String,
        /// Underlying service error
        #[source]
        source: Option<BoxError>,
    },

    /// Credentials were rejected or lack permission
    #[error("{operation} failed: permission denied on {target}")]
    PermissionDenied {
        /// Operation that failed
        operation: &'static str,
        /// Bucket or `bucket/key`
        target: String,
        /// Underlying service error
        #[source]
        source: Option<BoxError>,
    },

    /// Any other failure reported by the storage service
    #[error("{operation} failed on {target}: service error (status: {status:?}, code: {code:?})")]
    ServiceError {
        /// Operation that failed
        operation: &'static str,
        /// Bucket or `bucket/key`
        target: String,
        /// HTTP status of the response, if one was received
        status: Option<u16>,
        /// S3 error code, if the response carried one
        code: Option<String>,
        /// Underlying service error
        #[source]
        source: Option<BoxError>,
    },

    /// The request never produced a response (connect, TLS, timeout)
    #[error("{operation} failed on {target}: network error")]
    NetworkError {
        /// Operation that failed
        operation: &'static str,
        /// Bucket or `bucket/key`
        target: String,
        /// Transport error
        #[source]
        source: BoxError,
    },
}

/// Category of a failure reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemoteErrorKind {
    AlreadyExists,
    NotFound,
    PermissionDenied,
    Service,
}

/// Maps an S3 error code and HTTP status onto a [`RemoteErrorKind`].
///
/// The error code wins when present; HEAD responses carry no body, so the
/// status is the only signal for them.
pub(crate) fn classify_remote(code: Option<&str>, status: Option<u16>) -> RemoteErrorKind {
    match code {
        Some("BucketAlreadyExists" | "BucketAlreadyOwnedByYou") => {
            return RemoteErrorKind::AlreadyExists;
        }
        Some("NoSuchBucket" | "NoSuchKey" | "NotFound" | "NoSuchBucketPolicy") => {
            return RemoteErrorKind::NotFound;
        }
        Some(
            "AccessDenied"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "AllAccessDisabled"
            | "ExpiredToken",
        ) => return RemoteErrorKind::PermissionDenied,
        _ => {}
    }

    match status {
        Some(404) => RemoteErrorKind::NotFound,
        Some(401 | 403) => RemoteErrorKind::PermissionDenied,
        Some(409) if code.is_none() => RemoteErrorKind::AlreadyExists,
        _ => RemoteErrorKind::Service,
    }
}

impl StorageError {
    /// Builds an error from a remote failure that has already been reduced
    /// to an error code and status
    pub(crate) fn from_remote(
        operation: &'static str,
        target: String,
        code: Option<String>,
        status: Option<u16>,
        source: Option<BoxError>,
    ) -> Self {
        match classify_remote(code.as_deref(), status) {
            RemoteErrorKind::AlreadyExists => Self::AlreadyExists {
                operation,
                target,
                source,
            },
            RemoteErrorKind::NotFound => Self::NotFound {
                operation,
                target,
                source,
            },
            RemoteErrorKind::PermissionDenied => Self::PermissionDenied {
                operation,
                target,
                source,
            },
            RemoteErrorKind::Service => Self::ServiceError {
                operation,
                target,
                status,
                code,
                source,
            },
        }
    }

    /// Classifies an AWS SDK error for `operation` on `target`
    pub(crate) fn from_sdk<E>(
        operation: &'static str,
        target: impl Into<String>,
        error: SdkError<E>,
    ) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let target = target.into();

        if matches!(
            error,
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
        ) {
            return Self::NetworkError {
                operation,
                target,
                source: Box::new(error),
            };
        }

        let code = error.code().map(ToOwned::to_owned);
        let status = error.raw_response().map(|raw| raw.status().as_u16());

        Self::from_remote(operation, target, code, status, Some(Box::new(error)))
    }

    /// Whether repeating the same call could succeed without changing
    /// configuration or input. The crate never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError { .. } => true,
            Self::ServiceError { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}
