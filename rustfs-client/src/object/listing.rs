//! Lazy, paginated key listing

use std::collections::VecDeque;

use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::bucket::validate_bucket_name;
use crate::error::{StorageError, StorageResult};

#[derive(Debug)]
enum ListingState {
    /// Next page has not been requested yet
    Pending { continuation_token: Option<String> },
    /// The last page has been received
    Exhausted,
    /// An error was yielded; nothing more will be produced
    Failed,
}

/// Keys of a bucket, fetched one ListObjectsV2 page at a time
///
/// The listing is finite and cannot be restarted. The first error is yielded
/// once, after which the listing is exhausted.
#[derive(Debug)]
pub struct ObjectListing {
    s3: S3Client,
    bucket: String,
    prefix: Option<String>,
    buffered: VecDeque<String>,
    state: ListingState,
}

impl ObjectListing {
    pub(crate) fn new(s3: S3Client, bucket: &str, prefix: Option<&str>) -> Self {
        Self {
            s3,
            bucket: bucket.to_string(),
            prefix: prefix.map(ToOwned::to_owned),
            buffered: VecDeque::new(),
            state: ListingState::Pending {
                continuation_token: None,
            },
        }
    }

    /// Bucket being listed
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the next key, fetching another page when the buffer runs dry
    ///
    /// Yields `None` once every key has been returned or after an error.
    pub async fn next_key(&mut self) -> Option<StorageResult<String>> {
        loop {
            if let Some(key) = self.buffered.pop_front() {
                return Some(Ok(key));
            }

            let continuation_token = match &mut self.state {
                ListingState::Pending { continuation_token } => continuation_token.take(),
                ListingState::Exhausted | ListingState::Failed => return None,
            };

            if let Err(e) = self.fetch_page(continuation_token).await {
                self.state = ListingState::Failed;
                return Some(Err(e));
            }
        }
    }

    /// Drains the listing into a vector
    ///
    /// # Errors
    ///
    /// Returns the first error hit; keys gathered before it are dropped
    pub async fn collect_keys(mut self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        while let Some(key) = self.next_key().await {
            keys.push(key?);
        }
        Ok(keys)
    }

    async fn fetch_page(&mut self, continuation_token: Option<String>) -> StorageResult<()> {
        validate_bucket_name(&self.bucket)?;

        let output = self
            .s3
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(self.prefix.clone())
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("list_objects", self.bucket.clone(), e))?;

        self.buffered.extend(
            output
                .contents()
                .iter()
                .filter_map(|object| object.key().map(ToOwned::to_owned)),
        );

        debug!(
            "Listed {} keys from bucket {} (prefix: {:?})",
            self.buffered.len(),
            self.bucket,
            self.prefix
        );

        self.state = match output.next_continuation_token() {
            Some(token) if output.is_truncated().unwrap_or(false) => ListingState::Pending {
                continuation_token: Some(token.to_string()),
            },
            _ => ListingState::Exhausted,
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RustfsClient;
    use crate::config::ClientConfig;

    fn unreachable_client() -> RustfsClient {
        let config = ClientConfig::new("127.0.0.1:1", "ak", "sk")
            .unwrap()
            .with_tls(false);
        RustfsClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_error_is_yielded_once() {
        let client = unreachable_client();
        let mut listing = client.list_objects("photos", None);
        assert_eq!(listing.bucket(), "photos");

        let first = listing.next_key().await;
        assert!(
            matches!(
                first,
                Some(Err(StorageError::NetworkError { operation: "list_objects", .. }))
            ),
            "{first:?}"
        );
        assert!(listing.next_key().await.is_none());
        assert!(listing.next_key().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_bucket_name_fails_listing() {
        let client = unreachable_client();

        let result = client.list_object_keys("", None).await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }
}
