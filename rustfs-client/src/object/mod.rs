//! Object upload, removal and listing

mod listing;

use std::path::Path;

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, instrument};

pub use listing::ObjectListing;

use crate::client::RustfsClient;
use crate::content_type::resolve_content_type;
use crate::error::{StorageError, StorageResult};
use crate::presign::ObjectRef;

/// Summary of a completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadInfo {
    /// Bucket the object was written to
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Number of bytes uploaded
    pub size: u64,
    /// Entity tag returned by the service, if any
    pub etag: Option<String>,
    /// Content type the object was stored with
    pub content_type: String,
}

impl RustfsClient {
    /// Uploads an in-memory object
    ///
    /// # Arguments
    ///
    /// * `bucket` - Target bucket
    /// * `key` - Object key
    /// * `body` - Object contents
    /// * `content_type` - Explicit content type; resolved from `key` when `None`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an empty bucket or key, or a
    /// key with `.`/`..` segments, otherwise the classified service or
    /// network error
    #[instrument(skip(self, body), fields(size = body.len()))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<UploadInfo> {
        let object = ObjectRef::new(bucket, key);
        object.validate()?;

        let size = body.len() as u64;
        self.put_object(object, ByteStream::from(body), size, content_type).await
    }

    /// Streams a local file into an object
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if the file cannot be read,
    /// otherwise see [`RustfsClient::upload_object`]
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: impl AsRef<Path>,
        content_type: Option<&str>,
    ) -> StorageResult<UploadInfo> {
        let path = path.as_ref();
        let object = ObjectRef::new(bucket, key);
        object.validate()?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            StorageError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(StorageError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let body = ByteStream::from_path(path).await.map_err(|e| {
            StorageError::InvalidInput(format!("cannot open {}: {e}", path.display()))
        })?;

        self.put_object(object, body, metadata.len(), content_type).await
    }

    async fn put_object(
        &self,
        object: ObjectRef,
        body: ByteStream,
        size: u64,
        content_type: Option<&str>,
    ) -> StorageResult<UploadInfo> {
        let content_type = content_type
            .unwrap_or_else(|| resolve_content_type(&object.key))
            .to_string();

        let content_length = i64::try_from(size).map_err(|_| {
            StorageError::InvalidInput(format!("object {object} is too large: {size} bytes"))
        })?;

        let output = self
            .s3
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(body)
            .content_length(content_length)
            .content_type(&content_type)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("upload_object", object.to_string(), e))?;

        let info = UploadInfo {
            etag: output.e_tag().map(|etag| etag.trim_matches('"').to_string()),
            bucket: object.bucket,
            key: object.key,
            size,
            content_type,
        };

        info!(
            "Successfully uploaded {}/{} (size: {}, etag: {:?}, content-type: {})",
            info.bucket, info.key, info.size, info.etag, info.content_type
        );

        Ok(info)
    }

    /// Deletes an object
    ///
    /// S3 treats deleting a missing key as success, so this does too.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the bucket does not exist,
    /// otherwise the classified service or network error
    #[instrument(skip(self))]
    pub async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let object = ObjectRef::new(bucket, key);
        object.validate()?;

        self.s3
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("delete_object", object.to_string(), e))?;

        info!("Successfully deleted {}", object);
        Ok(())
    }

    /// Checks whether an object exists
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the object exists
    /// * `Ok(false)` if it does not
    ///
    /// # Errors
    ///
    /// Returns the classified service or network error for anything but a
    /// not-found response
    #[instrument(skip(self))]
    pub async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let object = ObjectRef::new(bucket, key);
        object.validate()?;

        match self.s3.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                debug!("Object does not exist: {}", object);
                Ok(false)
            }
            Err(e) => Err(StorageError::from_sdk("object_exists", object.to_string(), e)),
        }
    }

    /// Lists every key in `bucket` that starts with `prefix`
    ///
    /// Pages are fetched as the listing is consumed. Nothing is sent until
    /// the first call to [`ObjectListing::next_key`].
    #[must_use]
    pub fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> ObjectListing {
        ObjectListing::new(self.s3.clone(), bucket, prefix)
    }

    /// Collects every key in `bucket` that starts with `prefix`
    ///
    /// # Errors
    ///
    /// Returns the first error hit while listing; partial results are dropped
    pub async fn list_object_keys(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> StorageResult<Vec<String>> {
        self.list_objects(bucket, prefix).collect_keys().await
    }

    /// Direct, unsigned URL of an object
    ///
    /// Anonymous reads through this URL only succeed when the bucket policy
    /// allows them, see [`crate::BucketPolicy::PublicRead`].
    #[must_use]
    pub fn public_object_url(&self, bucket: &str, key: &str) -> String {
        self.presigner.object_url(&ObjectRef::new(bucket, key))
    }
}
