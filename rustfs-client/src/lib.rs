//! Client for RustFS and other S3-compatible object stores
//!
//! Wraps bucket and object management and issues presigned GET/PUT URLs so
//! that parties without credentials can download or upload a single object.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use rustfs_client::{BucketPolicy, ClientConfig, RustfsClient};
//!
//! # async fn run() -> rustfs_client::StorageResult<()> {
//! let config = ClientConfig::new("localhost:9000", "minioadmin", "minioadmin")?.with_tls(false);
//! let client = RustfsClient::new(config)?;
//!
//! client.create_bucket("uploads", None).await?;
//! client.set_bucket_policy("uploads", BucketPolicy::PublicRead).await?;
//!
//! let upload = client.presigned_put_url("uploads", "hello.txt", Duration::from_secs(300))?;
//! client
//!     .put_presigned(&upload.url, Bytes::from_static(b"hello"), Some("text/plain"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Bucket lifecycle and policy operations
pub mod bucket;

/// Storage client handle
pub mod client;

/// Client configuration
pub mod config;

/// Content type resolution by file extension
pub mod content_type;

/// Error types
pub mod error;

/// Object upload, removal and listing
pub mod object;

/// Presigned URL issuance
pub mod presign;

/// Transfers over presigned URLs
pub mod transfer;

pub use bucket::BucketPolicy;
pub use client::RustfsClient;
pub use config::{AddressingStyle, ClientConfig, DEFAULT_REGION};
pub use content_type::{resolve_content_type, FALLBACK_CONTENT_TYPE};
pub use error::{BoxError, StorageError, StorageResult};
pub use object::{ObjectListing, UploadInfo};
pub use presign::{
    ObjectRef, PresignRequest, PresignedUrl, Presigner, MAX_PRESIGN_EXPIRY,
};
