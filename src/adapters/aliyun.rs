//! Alibaba Cloud RPC client.
//!
//! Requests are signed with ACS3-HMAC-SHA256: a canonical request built from
//! method, path, sorted query, sorted `host`/`x-acs-*` headers and the body
//! hash is hashed into a string-to-sign, which is HMAC'd with the AccessKey
//! secret.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name, also the prefix of the string-to-sign
pub const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// Errors from an RPC call
#[derive(Debug, Error)]
pub enum AliyunError {
    /// The service answered with an error response
    #[error("Aliyun API error ({status}) {code}: {message} [request {request_id}]")]
    Server {
        status: u16,
        code: String,
        message: String,
        request_id: String,
    },

    #[error("Aliyun request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode Aliyun response: {0}")]
    Decode(String),

    #[error("Invalid Aliyun endpoint: {0}")]
    Endpoint(String),

    #[error("Failed to sign Aliyun request: {0}")]
    Signing(String),
}

/// Error body returned by RPC endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    request_id: String,
}

/// One RPC call
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Base URL of the product endpoint, e.g. `https://filetrans.cn-shanghai.aliyuncs.com`
    pub endpoint: String,
    /// API action (`x-acs-action`)
    pub action: String,
    /// API version (`x-acs-version`)
    pub version: String,
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// Raw request body
    pub body: Vec<u8>,
}

impl RpcRequest {
    pub fn new(endpoint: &str, action: &str, version: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            action: action.to_string(),
            version: version.to_string(),
            query: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the request body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

/// Signed headers for one request
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// Lower-case header name to value, sorted
    pub headers: BTreeMap<String, String>,
    /// Value of the Authorization header
    pub authorization: String,
}

/// Alibaba Cloud RPC client
pub struct AcsClient {
    /// AccessKey ID
    key_id: String,
    /// AccessKey secret
    key_secret: String,
    /// HTTP client
    client: reqwest::Client,
}

impl AcsClient {
    /// Create a new client
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            client: reqwest::Client::new(),
        }
    }

    /// Send a signed POST and return the JSON body
    pub async fn call(&self, request: &RpcRequest) -> Result<Value, AliyunError> {
        let url = reqwest::Url::parse(&request.endpoint)
            .map_err(|e| AliyunError::Endpoint(format!("{}: {}", request.endpoint, e)))?;
        let host = host_header(&url)
            .ok_or_else(|| AliyunError::Endpoint(request.endpoint.clone()))?;

        let signed = self.sign(
            "POST",
            &host,
            request,
            Utc::now(),
            &Uuid::new_v4().to_string(),
        )?;

        let mut builder = self
            .client
            .post(format!("{}/", request.endpoint))
            .query(&request.query)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/octet-stream")
            .body(request.body.clone());

        for (name, value) in &signed.headers {
            if name != "host" {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) if !body.code.is_empty() => AliyunError::Server {
                    status: status.as_u16(),
                    code: body.code,
                    message: body.message,
                    request_id: body.request_id,
                },
                _ => AliyunError::Server {
                    status: status.as_u16(),
                    code: status.as_str().to_string(),
                    message: text,
                    request_id: String::new(),
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| AliyunError::Decode(e.to_string()))
    }

    /// Compute the signed headers for a request
    pub fn sign(
        &self,
        method: &str,
        host: &str,
        request: &RpcRequest,
        date: DateTime<Utc>,
        nonce: &str,
    ) -> Result<SignedHeaders, AliyunError> {
        let payload_hash = hex::encode(Sha256::digest(&request.body));

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), host.to_string());
        headers.insert("x-acs-action".to_string(), request.action.clone());
        headers.insert("x-acs-version".to_string(), request.version.clone());
        headers.insert(
            "x-acs-date".to_string(),
            date.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        headers.insert("x-acs-signature-nonce".to_string(), nonce.to_string());
        headers.insert("x-acs-content-sha256".to_string(), payload_hash.clone());

        let signed_names = headers.keys().cloned().collect::<Vec<_>>().join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();

        let canonical_request = format!(
            "{}\n/\n{}\n{}\n{}\n{}",
            method,
            canonical_query(&request.query),
            canonical_headers,
            signed_names,
            payload_hash
        );

        let string_to_sign = format!(
            "{}\n{}",
            SIGNATURE_ALGORITHM,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|e| AliyunError::Signing(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let authorization = format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            SIGNATURE_ALGORITHM, self.key_id, signed_names, signature
        );

        Ok(SignedHeaders {
            headers,
            authorization,
        })
    }
}

/// Host header value, including a non-default port
fn host_header(url: &reqwest::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Sorted, RFC 3986 percent-encoded query string
pub fn canonical_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
