//! Azure Blob Storage transport.
//!
//! Talks to the Blob REST API directly with Shared Key authorization:
//! `PUT` a block blob to upload, `GET` it to download. The account key is the
//! base64 key shown in the storage account's access keys page.

use std::io::Read;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::TransportError;
use super::transport::{BlobTransport, Connector, Credentials};

type HmacSha256 = Hmac<Sha256>;

/// Host suffix for public-cloud storage accounts.
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "blob.core.windows.net";

/// REST API version sent with every request.
const API_VERSION: &str = "2021-08-06";

/// Downloads larger than this are refused.
const MAX_OBJECT_BYTES: u64 = 64 * 1024 * 1024;

/// Opens [`AzureBlobTransport`]s.
#[derive(Debug, Clone)]
pub struct AzureConnector {
    endpoint_suffix: String,
    timeout: Duration,
}

impl Default for AzureConnector {
    fn default() -> Self {
        Self {
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AzureConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different host suffix (sovereign clouds).
    #[must_use]
    pub fn with_endpoint_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.endpoint_suffix = suffix.into();
        self
    }

    /// Overall deadline for each request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Connector for AzureConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn BlobTransport>, TransportError> {
        Ok(Box::new(AzureBlobTransport::new(
            credentials,
            &self.endpoint_suffix,
            self.timeout,
        )?))
    }
}

/// One container in one storage account.
pub struct AzureBlobTransport {
    agent: ureq::Agent,
    account: String,
    container: String,
    key: Vec<u8>,
    base_url: String,
}

impl std::fmt::Debug for AzureBlobTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobTransport")
            .field("account", &self.account)
            .field("container", &self.container)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AzureBlobTransport {
    /// Build a transport for `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the account name is not a valid storage
    /// account name or the key is not base64.
    pub fn new(
        credentials: &Credentials,
        endpoint_suffix: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let account = credentials.account_name.trim().to_string();
        if !account
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(TransportError::Unauthorized(format!(
                "'{account}' is not a valid storage account name"
            )));
        }

        let key = STANDARD
            .decode(credentials.account_key.trim())
            .map_err(|e| TransportError::Unauthorized(format!("account key is not base64: {e}")))?;

        let container = credentials.container_name.trim().to_string();
        let base_url = format!("https://{account}.{endpoint_suffix}/{container}");

        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            account,
            container,
            key,
            base_url,
        })
    }

    fn url(&self, object_name: &str) -> String {
        format!("{}/{object_name}", self.base_url)
    }

    /// Canonical string for Shared Key authorization.
    fn string_to_sign(
        &self,
        verb: &str,
        content_length: usize,
        content_type: &str,
        ms_headers: &[(&str, &str)],
        object_name: &str,
    ) -> String {
        // Content-Length is signed as empty when zero
        let length = if content_length == 0 {
            String::new()
        } else {
            content_length.to_string()
        };

        let mut headers: Vec<(&str, &str)> = ms_headers.to_vec();
        headers.sort_by_key(|(name, _)| *name);
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        format!(
            "{verb}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}/{}/{}/{object_name}",
            self.account, self.container
        )
    }

    fn authorization(&self, string_to_sign: &str) -> Result<String, TransportError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TransportError::Unauthorized(format!("invalid account key: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{signature}", self.account))
    }
}

impl BlobTransport for AzureBlobTransport {
    fn put(&self, object_name: &str, bytes: &[u8]) -> Result<(), TransportError> {
        check_object_name(object_name)?;
        let date = http_date();
        let ms_headers = [
            ("x-ms-blob-type", "BlockBlob"),
            ("x-ms-date", date.as_str()),
            ("x-ms-version", API_VERSION),
        ];
        let content_type = "application/json";
        let auth = self.authorization(&self.string_to_sign(
            "PUT",
            bytes.len(),
            content_type,
            &ms_headers,
            object_name,
        ))?;

        tracing::debug!(
            account = %self.account,
            container = %self.container,
            object = object_name,
            bytes = bytes.len(),
            "uploading blob"
        );

        let mut request = self
            .agent
            .put(&self.url(object_name))
            .set("Authorization", &auth)
            .set("Content-Type", content_type);
        for (name, value) in ms_headers {
            request = request.set(name, value);
        }

        request
            .send_bytes(bytes)
            .map(|_| ())
            .map_err(|e| map_ureq_error(e, object_name))
    }

    fn get(&self, object_name: &str) -> Result<Vec<u8>, TransportError> {
        check_object_name(object_name)?;
        let date = http_date();
        let ms_headers = [("x-ms-date", date.as_str()), ("x-ms-version", API_VERSION)];
        let auth =
            self.authorization(&self.string_to_sign("GET", 0, "", &ms_headers, object_name))?;

        tracing::debug!(
            account = %self.account,
            container = %self.container,
            object = object_name,
            "downloading blob"
        );

        let mut request = self
            .agent
            .get(&self.url(object_name))
            .set("Authorization", &auth);
        for (name, value) in ms_headers {
            request = request.set(name, value);
        }

        let response = request.call().map_err(|e| map_ureq_error(e, object_name))?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_OBJECT_BYTES + 1)
            .read_to_end(&mut body)
            .map_err(|e| TransportError::Network(format!("failed to read body: {e}")))?;

        if body.len() as u64 > MAX_OBJECT_BYTES {
            return Err(TransportError::Remote {
                status: 200,
                detail: format!("object exceeds {MAX_OBJECT_BYTES} bytes"),
            });
        }
        Ok(body)
    }
}

/// RFC 1123 date as required by `x-ms-date`.
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Names are used unescaped in both the URL and the signed resource.
fn check_object_name(object_name: &str) -> Result<(), TransportError> {
    let valid = !object_name.is_empty()
        && object_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    if valid {
        Ok(())
    } else {
        Err(TransportError::Remote {
            status: 400,
            detail: format!("unsupported blob name '{object_name}'"),
        })
    }
}

fn map_ureq_error(err: ureq::Error, object_name: &str) -> TransportError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let detail = azure_error_detail(&body).unwrap_or_else(|| body.trim().to_string());
            tracing::warn!(status, detail = %detail, "blob request rejected");
            match status {
                404 => TransportError::NotFound(object_name.to_string()),
                401 | 403 => TransportError::Unauthorized(detail),
                _ => TransportError::Remote { status, detail },
            }
        }
        ureq::Error::Transport(transport) => TransportError::Network(transport.to_string()),
    }
}

/// Pull `Code: Message` out of an Azure XML error body.
fn azure_error_detail(body: &str) -> Option<String> {
    let code = xml_element(body, "Code")?;
    match xml_element(body, "Message") {
        Some(message) => {
            let first_line = message.lines().next().unwrap_or_default();
            Some(format!("{code}: {first_line}"))
        }
        None => Some(code.to_string()),
    }
}

fn xml_element<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    // "secret-key-bytes" in base64
    const KEY: &str = "c2VjcmV0LWtleS1ieXRlcw==";

    fn transport() -> AzureBlobTransport {
        let creds = Credentials::new("pomoacct", "sync", KEY);
        AzureBlobTransport::new(&creds, DEFAULT_ENDPOINT_SUFFIX, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url() {
        assert_eq!(
            transport().url("pomotrack-sync.json"),
            "https://pomoacct.blob.core.windows.net/sync/pomotrack-sync.json"
        );
    }

    #[test]
    fn test_string_to_sign_for_put() {
        let signed = transport().string_to_sign(
            "PUT",
            42,
            "application/json",
            &[
                ("x-ms-version", API_VERSION),
                ("x-ms-date", "Thu, 01 Jan 2026 00:00:00 GMT"),
                ("x-ms-blob-type", "BlockBlob"),
            ],
            "snap.json",
        );

        let expected = "PUT\n\n\n42\n\napplication/json\n\n\n\n\n\n\n\
                        x-ms-blob-type:BlockBlob\n\
                        x-ms-date:Thu, 01 Jan 2026 00:00:00 GMT\n\
                        x-ms-version:2021-08-06\n\
                        /pomoacct/sync/snap.json";
        assert_eq!(signed, expected);
    }

    #[test]
    fn test_string_to_sign_for_get_leaves_length_empty() {
        let signed = transport().string_to_sign("GET", 0, "", &[], "snap.json");
        assert_eq!(signed, "GET\n\n\n\n\n\n\n\n\n\n\n\n/pomoacct/sync/snap.json");
    }

    #[test]
    fn test_authorization_header() {
        let t = transport();
        let auth = t.authorization("GET\n").unwrap();
        assert!(auth.starts_with("SharedKey pomoacct:"));

        let signature = auth.trim_start_matches("SharedKey pomoacct:");
        assert_eq!(STANDARD.decode(signature).unwrap().len(), 32);
        assert_eq!(auth, t.authorization("GET\n").unwrap());
        assert_ne!(auth, t.authorization("PUT\n").unwrap());
    }

    #[test]
    fn test_rejects_bad_key_and_account() {
        let bad_key = Credentials::new("pomoacct", "sync", "not base64!!");
        assert!(matches!(
            AzureBlobTransport::new(&bad_key, DEFAULT_ENDPOINT_SUFFIX, Duration::from_secs(1)),
            Err(TransportError::Unauthorized(_))
        ));

        let bad_account = Credentials::new("Pomo.Acct", "sync", KEY);
        assert!(matches!(
            AzureBlobTransport::new(&bad_account, DEFAULT_ENDPOINT_SUFFIX, Duration::from_secs(1)),
            Err(TransportError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_check_object_name() {
        assert!(check_object_name("pomotrack-sync.json").is_ok());
        assert!(check_object_name("backups/2026.json").is_ok());
        assert!(check_object_name("").is_err());
        assert!(check_object_name("with space.json").is_err());
    }

    #[test]
    fn test_azure_error_detail() {
        let body = "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error>\
                    <Code>AuthenticationFailed</Code>\
                    <Message>Server failed to authenticate the request.\nRequestId:abc</Message>\
                    </Error>";
        assert_eq!(
            azure_error_detail(body).unwrap(),
            "AuthenticationFailed: Server failed to authenticate the request."
        );
        assert!(azure_error_detail("plain text").is_none());
    }
}
