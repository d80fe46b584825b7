//! Transport seam between the session and the wire.
//!
//! The session only ever talks to a [`Transport`] handle obtained from a
//! [`Connector`]. Dropping the handle releases it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

/// The only status code the runner uses for success.
pub const STATUS_OK: u16 = 200;

/// HTTP method of a runner call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A call against the runner, relative to the session's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a POST request without a body.
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    /// Builder method to append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Builder method to attach a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path plus query, unencoded. Used for logging and error reports.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// What the runner answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for the runner's success status.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// An open handle to the runner.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one call. Any answer, success or not, is `Ok`.
    async fn send(&self, request: Request) -> Result<Response, ClientError>;
}

/// Opens transport handles for a base URL.
pub trait Connector: Send + Sync {
    /// Open a new handle.
    fn open(&self, base_url: &str) -> Result<Box<dyn Transport>, ClientError>;
}
