//! HTTP transport for the runner's REST interface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use crate::error::ClientError;
use crate::transport::{Connector, Method, Request, Response, Transport};

const JSON: &str = "application/json";

/// Opens reqwest-backed handles.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    request_timeout: Duration,
}

impl HttpConnector {
    /// Create a connector whose handles time out each request.
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl Connector for HttpConnector {
    fn open(&self, base_url: &str) -> Result<Box<dyn Transport>, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;
        Ok(Box::new(HttpTransport {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        }))
    }
}

/// HTTP client for the runner's REST endpoints.
pub struct HttpTransport {
    inner: reqwest::Client,
    base_url: String,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = ?request.method, url = %url, query = ?request.query, "HTTP request");

        let mut builder = match request.method {
            Method::Get => self.inner.get(&url),
            Method::Post => self.inner.post(&url),
        }
        .header(ACCEPT, JSON);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder.header(CONTENT_TYPE, JSON),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status, "HTTP response");
        Ok(Response { status, body })
    }
}
