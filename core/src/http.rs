//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. `ListsApi`
//! builds `HttpRequest` values and parses `HttpResponse` values without ever
//! touching the network; a `Transport` implementation performs the I/O.
//!
//! Request payloads stay as ordered field lists rather than pre-encoded
//! bytes. The wire format (URL-encoded form vs. multipart) is recorded in
//! `RequestBody` and left to the transport, which already knows how to
//! produce both.

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Request payload, as an ordered list of `(name, value)` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `multipart/form-data`, one text part per field.
    Multipart(Vec<(String, String)>),
}

impl RequestBody {
    pub fn fields(&self) -> &[(String, String)] {
        match self {
            RequestBody::Form(fields) | RequestBody::Multipart(fields) => fields,
        }
    }

    /// Value of the first field called `name`, if any.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields()
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL without its query string; `query` holds the
/// parameters in the order they were added.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Full URL including the URL-encoded query string.
    pub fn url(&self) -> Result<String, ApiError> {
        if self.query.is_empty() {
            return Ok(self.path.clone());
        }
        let query = serde_urlencoded::to_string(&self.query)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(format!("{}?{query}", self.path))
    }

    /// Value of the first query parameter called `name`, if any.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first header called `name` (case-insensitive), if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
