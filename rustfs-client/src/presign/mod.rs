//! Presigned URL issuance
//!
//! A presigned URL lets a party without credentials perform one kind of
//! request (GET or PUT) on one object until the URL expires. URLs are signed
//! locally with AWS Signature Version 4 in query-string form; minting one
//! never touches the network. The storage service verifies the signature and
//! the expiry when the URL is used.

pub(crate) mod sigv4;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::Method;
use serde::{Serialize, Serializer};
use tracing::debug;
use url::Url;

use crate::client::RustfsClient;
use crate::config::{AddressingStyle, ClientConfig};
use crate::error::{StorageError, StorageResult};
use sigv4::{uri_encode_path, CanonicalRequest, SigningCredentials};

/// Longest validity window SigV4 allows for a presigned URL (7 days)
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A bucket and a key inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
}

impl ObjectRef {
    /// Creates an object reference
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Rejects empty bucket names and keys, and keys with `.` or `..`
    /// segments, which HTTP clients collapse before sending
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if either part is empty or the
    /// key has a dot segment
    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket.is_empty() {
            return Err(StorageError::InvalidInput(
                "bucket name must not be empty".to_string(),
            ));
        }
        if self.key.is_empty() {
            return Err(StorageError::InvalidInput(format!(
                "object key in bucket {} must not be empty",
                self.bucket
            )));
        }
        if self.key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(StorageError::InvalidInput(format!(
                "object key {self} must not contain `.` or `..` segments"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// What to presign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Target object
    pub object: ObjectRef,
    /// HTTP method the URL authorizes; only GET and PUT are accepted
    pub method: Method,
    /// How long the URL stays valid after issuance
    pub expiry: Duration,
}

impl PresignRequest {
    /// Creates a request for an arbitrary method
    #[must_use]
    pub fn new(object: ObjectRef, method: Method, expiry: Duration) -> Self {
        Self {
            object,
            method,
            expiry,
        }
    }

    /// Request for a download URL
    #[must_use]
    pub fn get(bucket: impl Into<String>, key: impl Into<String>, expiry: Duration) -> Self {
        Self::new(ObjectRef::new(bucket, key), Method::GET, expiry)
    }

    /// Request for an upload URL
    #[must_use]
    pub fn put(bucket: impl Into<String>, key: impl Into<String>, expiry: Duration) -> Self {
        Self::new(ObjectRef::new(bucket, key), Method::PUT, expiry)
    }
}

/// A signed URL and its validity window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUrl {
    /// The presigned URL
    pub url: String,
    /// Method the URL authorizes
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// When the URL was signed
    pub issued_at: DateTime<Utc>,
    /// UTC instant after which the service rejects the URL
    pub expires_at: DateTime<Utc>,
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

impl fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Signs presigned URLs with a client's key material
#[derive(Clone)]
pub struct Presigner {
    credentials: SigningCredentials,
    scheme: &'static str,
    host: String,
    addressing: AddressingStyle,
}

impl fmt::Debug for Presigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presigner")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("addressing", &self.addressing)
            .finish_non_exhaustive()
    }
}

impl Presigner {
    /// Creates a presigner for the endpoint and credentials in `config`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConfig` if the endpoint has no host
    pub fn new(config: &ClientConfig) -> StorageResult<Self> {
        let endpoint = Url::parse(&config.endpoint_url()).map_err(|e| {
            StorageError::InvalidConfig(format!("invalid endpoint {}: {e}", config.endpoint()))
        })?;
        let host = endpoint.host_str().ok_or_else(|| {
            StorageError::InvalidConfig(format!("endpoint {} has no host", config.endpoint()))
        })?;

        // `Url` drops default ports, matching the Host header clients send
        let host = match endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            credentials: SigningCredentials::new(
                config.access_key(),
                config.secret_key(),
                config.region(),
            ),
            scheme: config.scheme(),
            host,
            addressing: config.addressing(),
        })
    }

    /// Issues a presigned URL valid from now until now + expiry
    ///
    /// # Errors
    ///
    /// See [`Presigner::presign_at`]
    pub fn presign(&self, request: &PresignRequest) -> StorageResult<PresignedUrl> {
        self.presign_at(request, Utc::now())
    }

    /// Issues a presigned URL as if signed at `now`
    ///
    /// Checks run in the order listed below; nothing is signed when one fails.
    ///
    /// # Errors
    ///
    /// * `StorageError::InvalidInput` - empty bucket or key
    /// * `StorageError::UnsupportedOperation` - method other than GET or PUT;
    ///   DELETE is refused for any expiry
    /// * `StorageError::InvalidExpiry` - expiry shorter than one second
    /// * `StorageError::ExpiryTooLong` - expiry longer than [`MAX_PRESIGN_EXPIRY`]
    /// * `StorageError::SigningFailure` - the signature could not be computed
    pub fn presign_at(
        &self,
        request: &PresignRequest,
        now: DateTime<Utc>,
    ) -> StorageResult<PresignedUrl> {
        request.object.validate()?;
        check_method(&request.method, &request.object)?;
        let expires_secs = check_expiry(request.expiry, &request.object)?;

        let (host, canonical_uri) = self.locate(&request.object);

        let query = self
            .credentials
            .presign_query(&CanonicalRequest {
                method: request.method.as_str(),
                host: &host,
                canonical_uri: &canonical_uri,
                expires_secs,
                timestamp: now,
            })
            .map_err(|e| StorageError::SigningFailure {
                target: request.object.to_string(),
                reason: e.to_string(),
            })?;

        let url = format!("{}://{host}{canonical_uri}?{query}", self.scheme);

        let expires_at = i64::try_from(expires_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| StorageError::SigningFailure {
                target: request.object.to_string(),
                reason: format!("expiry of {expires_secs}s overflows the signing time"),
            })?;

        debug!(
            method = %request.method,
            target = %request.object,
            expires_secs,
            "Issued presigned URL"
        );

        Ok(PresignedUrl {
            url,
            method: request.method.clone(),
            issued_at: now,
            expires_at,
        })
    }

    /// Direct, unsigned URL of an object
    #[must_use]
    pub fn object_url(&self, object: &ObjectRef) -> String {
        let (host, canonical_uri) = self.locate(object);
        format!("{}://{host}{canonical_uri}", self.scheme)
    }

    /// Host header value and encoded path for `object`
    fn locate(&self, object: &ObjectRef) -> (String, String) {
        match self.addressing {
            AddressingStyle::Path => (
                self.host.clone(),
                format!(
                    "/{}/{}",
                    uri_encode_path(&object.bucket),
                    uri_encode_path(&object.key)
                ),
            ),
            AddressingStyle::VirtualHosted => (
                format!("{}.{}", object.bucket, self.host),
                format!("/{}", uri_encode_path(&object.key)),
            ),
        }
    }
}

impl RustfsClient {
    /// Issues a presigned URL for `request`, valid from now until now + expiry
    ///
    /// # Errors
    ///
    /// See [`Presigner::presign_at`]
    pub fn presigned_url(&self, request: &PresignRequest) -> StorageResult<PresignedUrl> {
        self.presigner.presign(request)
    }

    /// Issues a presigned URL as if signed at `now`
    ///
    /// # Errors
    ///
    /// See [`Presigner::presign_at`]
    pub fn presigned_url_at(
        &self,
        request: &PresignRequest,
        now: DateTime<Utc>,
    ) -> StorageResult<PresignedUrl> {
        self.presigner.presign_at(request, now)
    }

    /// Issues a presigned download URL
    ///
    /// # Errors
    ///
    /// See [`Presigner::presign_at`]
    pub fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> StorageResult<PresignedUrl> {
        self.presigned_url(&PresignRequest::get(bucket, key, expiry))
    }

    /// Issues a presigned upload URL
    ///
    /// # Errors
    ///
    /// See [`Presigner::presign_at`]
    pub fn presigned_put_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> StorageResult<PresignedUrl> {
        self.presigned_url(&PresignRequest::put(bucket, key, expiry))
    }

    /// Issues a presigned URL for a method given by name, e.g. `"get"`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedOperation` for anything but GET and
    /// PUT, otherwise see [`Presigner::presign_at`]
    pub fn presigned_url_for_method(
        &self,
        bucket: &str,
        key: &str,
        method: &str,
        expiry: Duration,
    ) -> StorageResult<PresignedUrl> {
        let object = ObjectRef::new(bucket, key);
        let method = parse_method(method, &object)?;
        self.presigned_url(&PresignRequest::new(object, method, expiry))
    }
}

/// Parses a method name case-insensitively, e.g. `"get"` or `"PUT"`
fn parse_method(method: &str, object: &ObjectRef) -> StorageResult<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
        StorageError::UnsupportedOperation {
            target: object.to_string(),
            method: method.to_string(),
            reason: "not an HTTP method; use GET or PUT",
        }
    })
}

fn check_method(method: &Method, object: &ObjectRef) -> StorageResult<()> {
    if *method == Method::GET || *method == Method::PUT {
        return Ok(());
    }

    let reason = if *method == Method::DELETE {
        "presigned DELETE is not allowed; use an authenticated delete instead"
    } else {
        "only GET and PUT can be presigned"
    };

    Err(StorageError::UnsupportedOperation {
        target: object.to_string(),
        method: method.to_string(),
        reason,
    })
}

fn check_expiry(expiry: Duration, object: &ObjectRef) -> StorageResult<u64> {
    let secs = expiry.as_secs();
    if secs == 0 {
        return Err(StorageError::InvalidExpiry {
            target: object.to_string(),
            expiry,
        });
    }
    if expiry > MAX_PRESIGN_EXPIRY {
        return Err(StorageError::ExpiryTooLong {
            target: object.to_string(),
            requested: expiry,
            max: MAX_PRESIGN_EXPIRY,
        });
    }
    Ok(secs)
}
