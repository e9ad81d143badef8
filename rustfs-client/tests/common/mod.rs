// Not every helper is used in every test, so we allow dead code
#![allow(dead_code)]

use rustfs_client::{ClientConfig, RustfsClient};

/// Setup test environment variables and tracing
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Client for the local test service
pub fn test_client() -> RustfsClient {
    setup_test_env();
    RustfsClient::new(ClientConfig::from_env().expect("test environment is incomplete"))
        .expect("failed to build client")
}

/// Unique bucket name so tests can run concurrently
pub fn unique_bucket_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Bucket that exists for the duration of a test
pub struct TestBucket {
    pub client: RustfsClient,
    pub name: String,
}

impl TestBucket {
    pub async fn new(prefix: &str) -> Self {
        let client = test_client();
        let name = unique_bucket_name(prefix);
        client
            .create_bucket(&name, None)
            .await
            .expect("failed to create test bucket");
        Self { client, name }
    }

    /// Removes every object and then the bucket itself
    pub async fn cleanup(self) {
        let keys = self
            .client
            .list_object_keys(&self.name, None)
            .await
            .unwrap_or_default();
        for key in keys {
            self.client.delete_object(&self.name, &key).await.ok();
        }
        self.client.delete_bucket(&self.name).await.ok();
    }
}
