//! Bucket access policies

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{StorageError, StorageResult};

const POLICY_VERSION: &str = "2012-10-17";

/// Access level of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BucketPolicy {
    /// Anyone may read objects; only the owner may write
    PublicRead,
    /// Owner-only access (no bucket policy)
    Private,
}

/// Bucket policy document in the S3 policy language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PolicyStatement {
    pub effect: String,
    pub principal: Principal,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Principal {
    #[serde(rename = "AWS")]
    pub aws: Vec<String>,
}

impl BucketPolicy {
    /// Policy document to install on `bucket`, or `None` when the bucket
    /// should carry no policy at all
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if the document cannot be encoded
    pub fn document(self, bucket: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Private => Ok(None),
            Self::PublicRead => {
                let document = PolicyDocument {
                    version: POLICY_VERSION.to_string(),
                    statement: vec![PolicyStatement {
                        effect: "Allow".to_string(),
                        principal: Principal {
                            aws: vec!["*".to_string()],
                        },
                        action: vec!["s3:GetObject".to_string()],
                        resource: vec![format!("arn:aws:s3:::{bucket}/*")],
                    }],
                };

                serde_json::to_string(&document).map(Some).map_err(|e| {
                    StorageError::InvalidInput(format!(
                        "failed to encode policy for bucket {bucket}: {e}"
                    ))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_public_read_document() {
        let raw = BucketPolicy::PublicRead
            .document("test-bucket")
            .unwrap()
            .unwrap();
        let document: PolicyDocument = serde_json::from_str(&raw).unwrap();

        assert_eq!(document.version, "2012-10-17");
        assert_eq!(document.statement.len(), 1);

        let statement = &document.statement[0];
        assert_eq!(statement.effect, "Allow");
        assert_eq!(statement.principal.aws, vec!["*"]);
        assert_eq!(statement.action, vec!["s3:GetObject"]);
        assert_eq!(statement.resource, vec!["arn:aws:s3:::test-bucket/*"]);
    }

    #[test]
    fn test_public_read_wire_format() {
        let raw = BucketPolicy::PublicRead.document("b").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["Statement"][0]["Principal"]["AWS"][0], "*");
        assert_eq!(value["Statement"][0]["Action"][0], "s3:GetObject");
    }

    #[test]
    fn test_private_has_no_document() {
        assert_eq!(BucketPolicy::Private.document("b").unwrap(), None);
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(BucketPolicy::PublicRead.to_string(), "public-read");
        assert_eq!(BucketPolicy::Private.to_string(), "private");
        assert_eq!(
            "public-read".parse::<BucketPolicy>().unwrap(),
            BucketPolicy::PublicRead
        );
        assert_eq!("PRIVATE".parse::<BucketPolicy>().unwrap(), BucketPolicy::Private);
        assert!("public-write".parse::<BucketPolicy>().is_err());
    }
}
