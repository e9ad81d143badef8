//! Transfers over presigned URLs
//!
//! These are the requests a credential-less party sends with a URL issued by
//! [`crate::Presigner`]. They never carry credentials of their own.

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::client::RustfsClient;
use crate::error::{BoxError, StorageError, StorageResult};

/// `<Error>` document the service returns with a failed request
#[derive(Debug, Default, Error, PartialEq, Eq)]
#[error(
    "{}: {}",
    .code.as_deref().unwrap_or("UnknownError"),
    .message.as_deref().unwrap_or("no message")
)]
struct ErrorDocument {
    code: Option<String>,
    message: Option<String>,
}

impl RustfsClient {
    /// Uploads `body` with a presigned PUT URL
    ///
    /// # Arguments
    ///
    /// * `url` - Presigned PUT URL
    /// * `body` - Object contents
    /// * `content_type` - Content type header; `application/octet-stream` when `None`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PermissionDenied` for 401/403 (including an
    /// expired URL), `StorageError::NotFound` for 404,
    /// `StorageError::ServiceError` for other non-2xx responses and
    /// `StorageError::NetworkError` if no response arrives
    #[instrument(skip_all, fields(target = %redact(url), size = body.len()))]
    pub async fn put_presigned(
        &self,
        url: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<StatusCode> {
        let fallback = mime::APPLICATION_OCTET_STREAM;
        let content_type = content_type.unwrap_or(fallback.essence_str());

        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| network_error("put_presigned", url, e))?;

        let response = check_status("put_presigned", url, response).await?;
        debug!("Presigned upload completed with status {}", response.status());
        Ok(response.status())
    }

    /// Downloads an object with a presigned GET URL
    ///
    /// # Errors
    ///
    /// See [`RustfsClient::put_presigned`]
    #[instrument(skip_all, fields(target = %redact(url)))]
    pub async fn get_presigned(&self, url: &str) -> StorageResult<Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| network_error("get_presigned", url, e))?;

        let body = check_status("get_presigned", url, response)
            .await?
            .bytes()
            .await
            .map_err(|e| network_error("get_presigned", url, e))?;

        debug!("Presigned download returned {} bytes", body.len());
        Ok(body)
    }
}

/// URL without its query string, so signatures never reach logs or errors
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

fn network_error(operation: &'static str, url: &str, error: reqwest::Error) -> StorageError {
    StorageError::NetworkError {
        operation,
        target: redact(url).to_string(),
        source: Box::new(error.without_url()),
    }
}

async fn check_status(
    operation: &'static str,
    url: &str,
    response: Response,
) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let document = parse_error_document(&body);
    let code = document.code.clone();
    let source = (document != ErrorDocument::default()).then(|| Box::new(document) as BoxError);

    Err(StorageError::from_remote(
        operation,
        redact(url).to_string(),
        code,
        Some(status.as_u16()),
        source,
    ))
}

/// Reads `Error/Code` and `Error/Message`; anything unparseable yields an
/// empty document
fn parse_error_document(body: &str) -> ErrorDocument {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut document = ErrorDocument::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => path.push(e.local_name().as_ref().to_vec()),
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let field = match path.as_slice() {
                    [root, field] if root.as_slice() == b"Error" => field.as_slice(),
                    _ => continue,
                };
                let Ok(text) = e.unescape() else { break };
                match field {
                    b"Code" => document.code = Some(text.into_owned()),
                    b"Message" => document.message = Some(text.into_owned()),
                    _ => {}
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    document
}
