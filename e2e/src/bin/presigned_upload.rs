//! Presigned upload round trip against a live RustFS / MinIO server
//!
//! Reads `RUSTFS_*` variables (optionally from `.env`), then creates a public
//! bucket, uploads through a presigned PUT URL and reads the object back
//! through a presigned GET URL.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use rustfs_client::{BucketPolicy, RustfsClient, StorageError};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const BUCKET: &str = "test-bucket";
const OBJECT_KEY: &str = "upload-test.txt";
const CONTENT: &str = "Hello from a presigned upload!";
const CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const URL_EXPIRY: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // JSON logs for log shippers, human-readable otherwise
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    let client = RustfsClient::from_env().context("failed to create storage client")?;

    match client.create_bucket(BUCKET, None).await {
        Ok(()) | Err(StorageError::AlreadyExists { .. }) => {}
        Err(e) => return Err(e).context("failed to create bucket"),
    }

    if let Err(e) = client.set_bucket_policy(BUCKET, BucketPolicy::PublicRead).await {
        warn!("Could not make bucket {} public: {}", BUCKET, e);
    }

    let upload = client.presigned_put_url(BUCKET, OBJECT_KEY, URL_EXPIRY)?;
    info!(
        "Presigned upload URL for {} (expires at {})",
        without_query(&upload.url),
        upload.expires_at
    );
    info!(
        "URL host comes from the configured endpoint ({})",
        client.config().endpoint()
    );

    let status = client
        .put_presigned(
            &upload.url,
            Bytes::from_static(CONTENT.as_bytes()),
            Some(CONTENT_TYPE),
        )
        .await
        .context("upload through presigned URL failed")?;
    info!("Upload finished with status {}", status);

    match client.list_object_keys(BUCKET, None).await {
        Ok(keys) => info!("Objects in {}: {:?}", BUCKET, keys),
        Err(e) => warn!("Failed to list objects: {}", e),
    }

    let download = client.presigned_get_url(BUCKET, OBJECT_KEY, URL_EXPIRY)?;
    info!(
        "Presigned download URL for {} (expires at {})",
        without_query(&download.url),
        download.expires_at
    );

    let body = client
        .get_presigned(&download.url)
        .await
        .context("download through presigned URL failed")?;
    info!("Downloaded content: {}", String::from_utf8_lossy(&body));

    anyhow::ensure!(
        body == CONTENT.as_bytes(),
        "downloaded content does not match what was uploaded"
    );

    info!("Public URL: {}", client.public_object_url(BUCKET, OBJECT_KEY));
    Ok(())
}

/// Drops the signature-bearing query string before a URL is logged
fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
