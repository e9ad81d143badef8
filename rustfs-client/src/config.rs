//! Connection configuration for the storage client

use std::env;
use std::fmt;
use std::time::Duration;

use strum::{Display, EnumString};
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How buckets are addressed in request URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AddressingStyle {
    /// `scheme://host/bucket/key`, required by RustFS and MinIO
    #[default]
    Path,
    /// `scheme://bucket.host/key`
    VirtualHosted,
}

/// Immutable connection settings for a [`RustfsClient`](crate::RustfsClient)
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: String,
    access_key: String,
    secret_key: String,
    use_tls: bool,
    skip_tls_verify: bool,
    region: String,
    addressing: AddressingStyle,
    operation_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with TLS on and certificate verification on
    ///
    /// # Arguments
    ///
    /// * `endpoint` - `host[:port]` of the storage service, without scheme
    /// * `access_key` - Access key ID
    /// * `secret_key` - Secret access key
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConfig` if any argument is empty or the
    /// endpoint is not a bare `host[:port]`
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> StorageResult<Self> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        if endpoint.is_empty() {
            return Err(StorageError::InvalidConfig(
                "endpoint must not be empty".to_string(),
            ));
        }
        if access_key.is_empty() {
            return Err(StorageError::InvalidConfig(
                "access key must not be empty".to_string(),
            ));
        }
        if secret_key.is_empty() {
            return Err(StorageError::InvalidConfig(
                "secret key must not be empty".to_string(),
            ));
        }

        validate_endpoint(&endpoint)?;

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            use_tls: true,
            skip_tls_verify: false,
            region: DEFAULT_REGION.to_string(),
            addressing: AddressingStyle::default(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        })
    }

    /// Loads the configuration from `RUSTFS_*` environment variables
    ///
    /// * `RUSTFS_ENDPOINT`, `RUSTFS_ACCESS_KEY`, `RUSTFS_SECRET_KEY` - required
    /// * `RUSTFS_USE_TLS` - optional, defaults to `true`
    /// * `RUSTFS_SKIP_TLS_VERIFY` - optional, defaults to `false`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConfig` if a required variable is missing,
    /// a boolean cannot be parsed, or the values fail [`ClientConfig::new`]
    pub fn from_env() -> StorageResult<Self> {
        let endpoint = required_var("RUSTFS_ENDPOINT")?;
        let access_key = required_var("RUSTFS_ACCESS_KEY")?;
        let secret_key = required_var("RUSTFS_SECRET_KEY")?;
        let use_tls = bool_var("RUSTFS_USE_TLS", true)?;
        let skip_tls_verify = bool_var("RUSTFS_SKIP_TLS_VERIFY", false)?;

        Ok(Self::new(endpoint, access_key, secret_key)?
            .with_tls(use_tls)
            .with_skip_tls_verify(skip_tls_verify))
    }

    /// Sets whether requests use `https`
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Sets whether server certificates are accepted without verification.
    /// Only takes effect when TLS is on.
    #[must_use]
    pub const fn with_skip_tls_verify(mut self, skip_tls_verify: bool) -> Self {
        self.skip_tls_verify = skip_tls_verify;
        self
    }

    /// Sets the signing region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the bucket addressing style
    #[must_use]
    pub const fn with_addressing(mut self, addressing: AddressingStyle) -> Self {
        self.addressing = addressing;
        self
    }

    /// Sets the timeout applied to each service operation
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// `host[:port]` of the storage service
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Access key ID
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Whether requests use `https`
    #[must_use]
    pub const fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Whether certificate verification is actually disabled
    #[must_use]
    pub const fn skip_tls_verify(&self) -> bool {
        self.use_tls && self.skip_tls_verify
    }

    /// Signing region
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Bucket addressing style
    #[must_use]
    pub const fn addressing(&self) -> AddressingStyle {
        self.addressing
    }

    /// Per-operation timeout
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// `http` or `https`
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Endpoint with scheme, e.g. `https://cdn.example.com`
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.endpoint)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("region", &self.region)
            .field("addressing", &self.addressing)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

fn validate_endpoint(endpoint: &str) -> StorageResult<()> {
    if endpoint.contains("://") {
        return Err(StorageError::InvalidConfig(format!(
            "endpoint must be host[:port] without a scheme, got {endpoint}"
        )));
    }

    let parsed = Url::parse(&format!("http://{endpoint}")).map_err(|e| {
        StorageError::InvalidConfig(format!("endpoint {endpoint} is not a valid host: {e}"))
    })?;

    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(StorageError::InvalidConfig(format!(
            "endpoint must not contain a path, got {endpoint}"
        )));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(StorageError::InvalidConfig(
            "endpoint must not embed credentials".to_string(),
        ));
    }

    Ok(())
}

fn required_var(name: &str) -> StorageResult<String> {
    env::var(name)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .ok_or_else(|| StorageError::InvalidConfig(format!("{name} environment variable not set")))
}

fn bool_var(name: &str, default: bool) -> StorageResult<bool> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };

    match raw.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(StorageError::InvalidConfig(format!(
            "{name} must be a boolean, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "RUSTFS_ENDPOINT",
            "RUSTFS_ACCESS_KEY",
            "RUSTFS_SECRET_KEY",
            "RUSTFS_USE_TLS",
            "RUSTFS_SKIP_TLS_VERIFY",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_new_defaults() {
        let config = ClientConfig::new("cdn.example.com", "ak", "sk").unwrap();
        assert_eq!(config.endpoint(), "cdn.example.com");
        assert!(config.use_tls());
        assert!(!config.skip_tls_verify());
        assert_eq!(config.region(), DEFAULT_REGION);
        assert_eq!(config.addressing(), AddressingStyle::Path);
        assert_eq!(config.endpoint_url(), "https://cdn.example.com");
    }

    #[test]
    fn test_new_rejects_empty_fields() {
        for (endpoint, ak, sk) in [("", "ak", "sk"), ("host", "", "sk"), ("host", "ak", "")] {
            let result = ClientConfig::new(endpoint, ak, sk);
            assert!(
                matches!(result, Err(StorageError::InvalidConfig(_))),
                "expected rejection for ({endpoint:?}, {ak:?}, {sk:?})"
            );
        }
    }

    #[test]
    fn test_new_rejects_scheme_and_path() {
        assert!(matches!(
            ClientConfig::new("https://cdn.example.com", "ak", "sk"),
            Err(StorageError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::new("cdn.example.com/files", "ak", "sk"),
            Err(StorageError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::new("user:pw@cdn.example.com", "ak", "sk"),
            Err(StorageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_new_accepts_port_and_trailing_slash() {
        let config = ClientConfig::new("localhost:9000/", "ak", "sk")
            .unwrap()
            .with_tls(false);
        assert_eq!(config.endpoint(), "localhost:9000");
        assert_eq!(config.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn test_skip_tls_verify_requires_tls() {
        let config = ClientConfig::new("localhost:9000", "ak", "sk")
            .unwrap()
            .with_tls(false)
            .with_skip_tls_verify(true);
        assert!(!config.skip_tls_verify());

        let config = config.with_tls(true);
        assert!(config.skip_tls_verify());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ClientConfig::new("localhost:9000", "ak", "super-secret").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_addressing_style_from_str() {
        assert_eq!("path".parse::<AddressingStyle>().unwrap(), AddressingStyle::Path);
        assert_eq!(
            "Virtual-Hosted".parse::<AddressingStyle>().unwrap(),
            AddressingStyle::VirtualHosted
        );
        assert!("dns".parse::<AddressingStyle>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var("RUSTFS_ENDPOINT", "localhost:9000");
        env::set_var("RUSTFS_ACCESS_KEY", "minioadmin");
        env::set_var("RUSTFS_SECRET_KEY", "minioadmin");
        env::set_var("RUSTFS_USE_TLS", "false");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.endpoint(), "localhost:9000");
        assert_eq!(config.access_key(), "minioadmin");
        assert!(!config.use_tls());
        assert!(!config.skip_tls_verify());

        env::set_var("RUSTFS_USE_TLS", "1");
        env::set_var("RUSTFS_SKIP_TLS_VERIFY", "yes");
        let config = ClientConfig::from_env().unwrap();
        assert!(config.use_tls());
        assert!(config.skip_tls_verify());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_and_invalid() {
        clear_env();
        assert!(matches!(
            ClientConfig::from_env(),
            Err(StorageError::InvalidConfig(_))
        ));

        env::set_var("RUSTFS_ENDPOINT", "localhost:9000");
        env::set_var("RUSTFS_ACCESS_KEY", "ak");
        env::set_var("RUSTFS_SECRET_KEY", "sk");
        env::set_var("RUSTFS_USE_TLS", "maybe");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(StorageError::InvalidConfig(_))
        ));

        clear_env();
    }
}
