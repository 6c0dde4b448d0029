use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{GraphError, GraphResult};

/// HTTP method enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
}

impl HttpMethod {
    /// Upper-case verb as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
        }
    }
}

/// Request payload accepted by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with a matching content type
    Json(Value),
    /// Sent as `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Raw bytes, e.g. file content
    Bytes(Vec<u8>),
}

/// Response data as seen by the client
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    status_code: u16,
    /// Reason phrase for the status
    status_text: String,
    /// Final URL after redirects
    url: String,
    /// Response body
    body: String,
}

impl HttpResponse {
    /// Create a new response; the status text is derived from the code
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();

        Self {
            status_code: status,
            status_text,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status_code
    }

    /// Get the reason phrase
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Get the final URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get a reference to the response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body as a JSON value, or `None` when it is empty or not JSON
    pub fn json_value(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    /// Check if successful (2xx status)
    pub fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }

    /// Check for HTTP 401
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == 401
    }
}

/// Trait for HTTP client operations, allowing for mocking
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a single HTTP request. Transport failures are errors; any
    /// status code, including 4xx/5xx, is returned as a response.
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<RequestBody>,
    ) -> GraphResult<HttpResponse>;
}

/// Implementation of HttpClient using reqwest
pub struct ReqwestHttpClient {
    /// Internal reqwest client
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> GraphResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphError::configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<RequestBody>,
    ) -> GraphResult<HttpResponse> {
        let mut request = self.client.request(method.into(), url);

        // Add headers
        for (key, value) in headers {
            request = request.header(key, value);
        }

        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Form(fields)) => request.form(&fields),
            Some(RequestBody::Bytes(bytes)) => request.body(bytes),
            None => request,
        };

        // Send request
        let response = request.send().await.map_err(|e| {
            GraphError::transient_with_source(format!("{} {} failed to send", method, url), e)
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| {
            GraphError::transient_with_source(format!("{} {} body unreadable", method, url), e)
        })?;

        Ok(HttpResponse::new(status, final_url, body))
    }
}
