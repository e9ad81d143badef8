//! Storage client handle

use std::sync::Arc;

use aws_sdk_s3::config::{
    retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Credentials, Region,
    RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::Client as S3Client;
use tracing::{info, warn};

use crate::config::{AddressingStyle, ClientConfig};
use crate::error::{StorageError, StorageResult};
use crate::presign::Presigner;

const CREDENTIALS_PROVIDER_NAME: &str = "rustfs-client";

/// Handle to an S3-compatible storage service
///
/// Built once and shared; cloning is cheap and every clone uses the same
/// connection pool. Bucket, object and presign operations are methods on
/// this type.
#[derive(Clone, Debug)]
pub struct RustfsClient {
    config: Arc<ClientConfig>,
    pub(crate) s3: S3Client,
    pub(crate) presigner: Presigner,
    pub(crate) http: reqwest::Client,
}

impl RustfsClient {
    /// Creates a client from a validated configuration
    ///
    /// No request is sent; connections are opened lazily.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConfig` if the HTTP transport cannot be
    /// built for the configured TLS policy
    pub fn new(config: ClientConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            config.access_key(),
            config.secret_key(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(config.operation_timeout())
            .build();

        // Callers own retry policy, so the SDK never retries on its own.
        // Checksums are only sent when an operation requires them, which
        // keeps RustFS and older MinIO releases happy.
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region().to_string()))
            .credentials_provider(credentials)
            .force_path_style(config.addressing() == AddressingStyle::Path)
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeout_config)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired);

        if config.skip_tls_verify() {
            warn!(
                "TLS certificate verification is disabled for {}",
                config.endpoint()
            );
            builder = insecure::with_insecure_transport(builder);
        }

        let s3 = S3Client::from_conf(builder.build());

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.skip_tls_verify())
            .timeout(config.operation_timeout())
            .build()
            .map_err(|e| StorageError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let presigner = Presigner::new(&config)?;

        info!(
            "Initialized storage client for {} (tls: {}, region: {})",
            config.endpoint(),
            config.use_tls(),
            config.region()
        );

        Ok(Self {
            config: Arc::new(config),
            s3,
            presigner,
            http,
        })
    }

    /// Creates a client from `RUSTFS_*` environment variables
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`RustfsClient::new`]
    pub fn from_env() -> StorageResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Configuration this client was built from
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying AWS SDK client, for operations this crate does not wrap
    #[must_use]
    pub const fn sdk_client(&self) -> &S3Client {
        &self.s3
    }

    /// Presigner bound to this client's credentials
    #[must_use]
    pub const fn presigner(&self) -> &Presigner {
        &self.presigner
    }
}

/// Transport that accepts any server certificate, for self-signed deployments
#[allow(deprecated)]
mod insecure {
    use std::sync::Arc;
    use std::time::SystemTime;

    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;
    use rustls::client::{ServerCertVerified, ServerCertVerifier};
    use rustls::{Certificate, ServerName};

    struct AcceptAnyServerCert;

    impl ServerCertVerifier for AcceptAnyServerCert {
        fn verify_server_cert(
            &self,
            _end_entity: &Certificate,
            _intermediates: &[Certificate],
            _server_name: &ServerName,
            _scts: &mut dyn Iterator<Item = &[u8]>,
            _ocsp_response: &[u8],
            _now: SystemTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }
    }

    pub(super) fn with_insecure_transport(
        builder: aws_sdk_s3::config::Builder,
    ) -> aws_sdk_s3::config::Builder {
        let tls_config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            .with_no_client_auth();

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        builder.http_client(HyperClientBuilder::new().build(connector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync + Clone>() {}

    #[test]
    fn test_client_is_shareable() {
        assert_send_sync::<RustfsClient>();
    }

    #[test]
    fn test_new_does_not_touch_network() {
        let config = ClientConfig::new("127.0.0.1:1", "ak", "sk")
            .unwrap()
            .with_tls(false);
        let client = RustfsClient::new(config).unwrap();
        assert_eq!(client.config().endpoint(), "127.0.0.1:1");
        assert_eq!(client.sdk_client().config().region().unwrap().as_ref(), "us-east-1");
    }

    #[test]
    fn test_new_with_skip_tls_verify() {
        let config = ClientConfig::new("localhost:9443", "ak", "sk")
            .unwrap()
            .with_skip_tls_verify(true);
        let client = RustfsClient::new(config).unwrap();
        assert!(client.config().skip_tls_verify());
    }
}
