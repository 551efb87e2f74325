//! Wire transport used by the client.
//!
//! The [`Transport`] trait is the seam between request building (done by
//! [`crate::client::Client`]) and the HTTP library. The default
//! implementation is [`HttpTransport`] on top of `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use std::{collections::BTreeMap, time::Duration};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::trace;
use url::Url;

/// Default user agent sent with every request
pub const USER_AGENT: &str = concat!("vagrant-cloud-rs/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError::new(error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Methods which are safe to retry transparently
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }

    /// Methods which carry their parameters in the query string
    pub fn uses_query(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Delete)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized JSON document
    Json(String),
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// A fully built request ready to be put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        TransportRequest {
            method,
            url,
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        TransportResponse {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response, whatever its status.
    ///
    /// Errors are reserved for failures where no response was received.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest` backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        trace!("{} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone());

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            Some(Body::Json(json)) => builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(json),
            Some(Body::Form(pairs)) => builder.form(&pairs),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        trace!("Received status {} with {} bytes", status, body.len());

        Ok(TransportResponse { status, body })
    }
}
