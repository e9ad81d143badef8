//! Bucket lifecycle and policy operations

mod policy;

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::{debug, info, instrument};

pub use policy::BucketPolicy;

use crate::client::RustfsClient;
use crate::config::DEFAULT_REGION;
use crate::error::{StorageError, StorageResult};

const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

pub(crate) fn validate_bucket_name(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() {
        return Err(StorageError::InvalidInput(
            "bucket name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl RustfsClient {
    /// Creates a bucket
    ///
    /// # Arguments
    ///
    /// * `bucket` - Name of the bucket to create
    /// * `region` - Location constraint; `None` or `us-east-1` sends none
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the bucket exists, otherwise
    /// the classified service or network error
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> StorageResult<()> {
        validate_bucket_name(bucket)?;

        if self.bucket_exists(bucket).await? {
            return Err(StorageError::AlreadyExists {
                operation: "create_bucket",
                target: bucket.to_string(),
                source: None,
            });
        }

        let mut request = self.s3.create_bucket().bucket(bucket);
        if let Some(region) = region.filter(|region| *region != DEFAULT_REGION) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("create_bucket", bucket, e))?;

        info!("Successfully created bucket: {}", bucket);
        Ok(())
    }

    /// Checks whether a bucket exists
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the bucket exists
    /// * `Ok(false)` if it does not
    ///
    /// # Errors
    ///
    /// Returns the classified service or network error for anything but a
    /// not-found response
    #[instrument(skip(self))]
    pub async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        validate_bucket_name(bucket)?;

        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadBucketError::NotFound(_)) =>
            {
                debug!("Bucket does not exist: {}", bucket);
                Ok(false)
            }
            Err(e) => Err(StorageError::from_sdk("bucket_exists", bucket, e)),
        }
    }

    /// Deletes an empty bucket
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the bucket does not exist and
    /// `StorageError::ServiceError` if it still holds objects
    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        validate_bucket_name(bucket)?;

        self.s3
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("delete_bucket", bucket, e))?;

        info!("Successfully deleted bucket: {}", bucket);
        Ok(())
    }

    /// Sets the access policy of a bucket
    ///
    /// `BucketPolicy::Private` removes any policy and may be called on a
    /// bucket that is already private.
    ///
    /// # Errors
    ///
    /// Returns the classified service or network error
    #[instrument(skip(self))]
    pub async fn set_bucket_policy(&self, bucket: &str, policy: BucketPolicy) -> StorageResult<()> {
        validate_bucket_name(bucket)?;

        match policy.document(bucket)? {
            Some(document) => {
                self.s3
                    .put_bucket_policy()
                    .bucket(bucket)
                    .policy(document)
                    .send()
                    .await
                    .map_err(|e| StorageError::from_sdk("set_bucket_policy", bucket, e))?;
            }
            None => match self.s3.delete_bucket_policy().bucket(bucket).send().await {
                Ok(_) => {}
                Err(e) if e.code() == Some(NO_SUCH_BUCKET_POLICY) => {
                    debug!("Bucket {} already has no policy", bucket);
                }
                Err(e) => return Err(StorageError::from_sdk("set_bucket_policy", bucket, e)),
            },
        }

        debug!("Set bucket policy for {} to {}", bucket, policy);
        Ok(())
    }

    /// Returns the raw policy document of a bucket, or `None` if it has none
    ///
    /// # Errors
    ///
    /// Returns the classified service or network error
    #[instrument(skip(self))]
    pub async fn bucket_policy(&self, bucket: &str) -> StorageResult<Option<String>> {
        validate_bucket_name(bucket)?;

        match self.s3.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy().map(ToOwned::to_owned)),
            Err(e) if e.code() == Some(NO_SUCH_BUCKET_POLICY) => Ok(None),
            Err(e) => Err(StorageError::from_sdk("bucket_policy", bucket, e)),
        }
    }
}
