//! AWS Signature Version 4 primitives for query-string presigning

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const TERMINATOR: &str = "aws4_request";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const SIGNED_HEADERS: &str = "host";

/// Key material a presigned URL is signed with
#[derive(Clone)]
pub(crate) struct SigningCredentials {
    access_key: String,
    secret_key: String,
    region: String,
}

/// Request fields covered by the signature
pub(crate) struct CanonicalRequest<'a> {
    /// Upper-case HTTP method
    pub method: &'a str,
    /// `host[:port]` exactly as the client will send it
    pub host: &'a str,
    /// Already-encoded absolute path
    pub canonical_uri: &'a str,
    /// Validity window in seconds
    pub expires_secs: u64,
    /// Signing instant
    pub timestamp: DateTime<Utc>,
}

impl SigningCredentials {
    pub(crate) fn new(access_key: &str, secret_key: &str, region: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
        }
    }

    fn credential_scope(&self, date: &str) -> String {
        format!("{date}/{}/{SERVICE}/{TERMINATOR}", self.region)
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>, InvalidLength> {
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        hmac_sha256(&k_service, TERMINATOR.as_bytes())
    }

    /// Produces the full query string for a presigned request, ending in
    /// `X-Amz-Signature`.
    pub(crate) fn presign_query(
        &self,
        request: &CanonicalRequest<'_>,
    ) -> Result<String, InvalidLength> {
        let date = request.timestamp.format("%Y%m%d").to_string();
        let amz_date = request.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = self.credential_scope(&date);

        let params = BTreeMap::from([
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            ("X-Amz-Credential", format!("{}/{scope}", self.access_key)),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", request.expires_secs.to_string()),
            ("X-Amz-SignedHeaders", SIGNED_HEADERS.to_string()),
        ]);
        let canonical_query = canonical_query_string(&params);

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\n{}\n{}",
            request.method,
            request.canonical_uri,
            canonical_query,
            request.host,
            SIGNED_HEADERS,
            UNSIGNED_PAYLOAD
        );

        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex_sha256(canonical_request.as_bytes())
        );

        let signature = hmac_sha256(&self.signing_key(&date)?, string_to_sign.as_bytes())?;

        Ok(format!(
            "{canonical_query}&X-Amz-Signature={}",
            hex::encode(signature)
        ))
    }
}

/// Percent-encodes an object path, keeping `/` as the segment separator
pub(crate) fn uri_encode_path(path: &str) -> String {
    uri_encode(path, true)
}

/// Percent-encodes a query key or value
pub(crate) fn uri_encode_value(value: &str) -> String {
    uri_encode(value, false)
}

fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            b'/' if keep_slash => encoded.push('/'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

fn canonical_query_string(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode_value(k), uri_encode_value(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_uri_encoding() {
        assert_eq!(uri_encode_path("/bucket/path/to/key"), "/bucket/path/to/key");
        assert_eq!(uri_encode_path("/bucket/my file.txt"), "/bucket/my%20file.txt");
        assert_eq!(uri_encode_path("/b/報告.pdf"), "/b/%E5%A0%B1%E5%91%8A.pdf");

        assert_eq!(uri_encode_value("path/to/key"), "path%2Fto%2Fkey");
        assert_eq!(uri_encode_value("a+b=c"), "a%2Bb%3Dc");
        assert_eq!(uri_encode_value("unreserved-_.~"), "unreserved-_.~");
    }

    #[test]
    fn test_signing_key_derivation_is_stable() {
        let creds = SigningCredentials::new("ak", "sk", "us-east-1");
        let first = creds.signing_key("20240115").unwrap();
        let second = creds.signing_key("20240115").unwrap();
        let next_day = creds.signing_key("20240116").unwrap();

        assert_eq!(first.len(), 32);
        assert_eq!(first, second);
        assert_ne!(first, next_day);
    }

    #[test]
    fn test_presign_query_layout() {
        let creds = SigningCredentials::new("access", "secret", "us-east-1");
        let query = creds
            .presign_query(&CanonicalRequest {
                method: "PUT",
                host: "localhost:9000",
                canonical_uri: "/bucket/key.txt",
                expires_secs: 300,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            })
            .unwrap();

        assert!(query.starts_with(
            "X-Amz-Algorithm=AWS4-HMAC-SHA256\
             &X-Amz-Credential=access%2F20240115%2Fus-east-1%2Fs3%2Faws4_request\
             &X-Amz-Date=20240115T120000Z\
             &X-Amz-Expires=300\
             &X-Amz-SignedHeaders=host\
             &X-Amz-Signature="
        ));

        let signature = query.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
