//! Request layer for the Vagrant Cloud API.
//!
//! [`Client`] turns a method, a path and a parameter tree into a wire request:
//! it injects the versioned API prefix, strips unset parameters, attaches the
//! bearer token and a request id, retries idempotent requests and maps failed
//! responses to [`RequestError`]. Every remote endpoint used by the resource
//! types is exposed as a method here.

use crate::{
    auth::{Auth, AuthError},
    data::Field,
    instrumentor::{Collection, Params, Timing},
    transport::{Body, HttpTransport, Method, Transport, TransportError, TransportRequest},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

pub const DEFAULT_URL_BASE: &str = "https://vagrantcloud.com";
pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Statuses treated as success
pub const EXPECTED_STATUSES: [u16; 3] = [200, 201, 204];
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const REQUEST_FAILED: &str = "Vagrant Cloud request failed";

/// A failed API response.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
    /// Error entries reported by the server
    pub errors: Vec<String>,
    pub status: u16,
}

impl RequestError {
    /// Build from a response body, appending the server's `errors` entry to
    /// the message when one is present.
    pub fn new(message: &str, body: &str, status: u16) -> Self {
        let mut full = message.to_string();
        let errors = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(object)) => match object.get("errors") {
                Some(Value::Array(entries)) => {
                    let entries: Vec<String> = entries.iter().map(error_text).collect();
                    full = format!("{} - {}", message, entries.join(", "));
                    entries
                }
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    let text = error_text(other);
                    if !text.is_empty() {
                        full = format!("{} - {}", message, text);
                    }
                    vec![text]
                }
            },
            Ok(_) => Vec::new(),
            Err(e) => vec![e.to_string()],
        };
        RequestError {
            message: full,
            errors,
            status,
        }
    }
}

fn error_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("connection is currently locked")]
    ConnectionLocked,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status of a failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request(e) => Some(e.status),
            _ => None,
        }
    }

    /// Failures an idempotent request may be sent again for.
    fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Request(_))
    }
}

/// API generation a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    pub fn number(&self) -> u8 {
        match self {
            ApiVersion::V1 => 1,
            ApiVersion::V2 => 2,
        }
    }
}

/// A single API call.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    params: Field,
    api_version: ApiVersion,
    wait: bool,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            params: Field::Unset,
            api_version: ApiVersion::V1,
            wait: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Request::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Request::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Request::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Request::new(Method::Delete, path)
    }

    pub fn params(mut self, params: Field) -> Self {
        self.params = params;
        self
    }

    pub fn api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    /// Fail with [`ClientError::ConnectionLocked`] instead of waiting.
    pub fn no_wait(mut self) -> Self {
        self.wait = false;
        self
    }
}

/// Optional box attributes sent on create and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxParams {
    pub short_description: Field,
    pub description: Field,
    pub is_private: Field,
}

/// Optional provider attributes sent on create and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderParams {
    pub url: Field,
    pub checksum: Field,
    pub checksum_type: Field,
    pub default_architecture: Field,
}

/// Box search filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// `downloads`, `created` or `updated`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// `desc` or `asc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl SearchParams {
    fn to_field(&self) -> Field {
        Field::map([
            ("q", Field::from(self.query.as_deref())),
            ("provider", Field::from(self.provider.as_deref())),
            ("sort", Field::from(self.sort.as_deref())),
            ("order", Field::from(self.order.as_deref())),
            ("limit", Field::from(self.limit)),
            ("page", Field::from(self.page)),
        ])
    }
}

/// Address of a provider. With an architecture the v2 API is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderTarget<'a> {
    pub username: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub provider: &'a str,
    pub architecture: Option<&'a str>,
}

impl ProviderTarget<'_> {
    fn api_version(&self) -> ApiVersion {
        match self.architecture {
            Some(_) => ApiVersion::V2,
            None => ApiVersion::V1,
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/box/{}/{}/version/{}/providers",
            self.username, self.name, self.version
        )
    }

    fn path(&self, suffix: &str) -> String {
        let mut path = format!(
            "/box/{}/{}/version/{}/provider/{}",
            self.username, self.name, self.version, self.provider
        );
        if let Some(architecture) = self.architecture {
            path.push('/');
            path.push_str(architecture);
        }
        path.push_str(suffix);
        path
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    url_base: String,
    retry_count: u32,
    retry_interval: Duration,
    timeout: Duration,
    access_token: Option<String>,
    auth: Option<Auth>,
    instrumentor: Option<Arc<Collection>>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        ClientBuilder {
            url_base: DEFAULT_URL_BASE.to_string(),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            access_token: None,
            auth: None,
            instrumentor: None,
            transport: None,
        }
    }

    /// Scheme and host of the service, optionally followed by a base path.
    pub fn url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = url_base.into();
        self
    }

    /// Total attempts for GET and HEAD requests.
    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Explicit token, resolved through [`Auth::new`] at build time.
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Use a fully resolved credential provider.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn instrumentor(mut self, instrumentor: Arc<Collection>) -> Self {
        self.instrumentor = Some(instrumentor);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        let (url_base, path_base) = split_url_base(&self.url_base)?;
        let auth = match self.auth {
            Some(auth) => auth,
            None => Auth::new(self.access_token)?,
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.timeout)?),
        };
        debug!("Creating client for {}{}", url_base, path_base);

        Ok(Client {
            inner: Arc::new(ClientInner {
                url_base,
                path_base,
                retry_count: self.retry_count,
                retry_interval: self.retry_interval,
                auth: Arc::new(auth),
                instrumentor: self
                    .instrumentor
                    .unwrap_or_else(|| Arc::new(Collection::new())),
                connection: Arc::new(Mutex::new(transport.clone())),
                transport,
            }),
        })
    }
}

/// Split `https://host/base/api/v1` into the origin and `/base`.
fn split_url_base(url_base: &str) -> Result<(Url, String), ClientError> {
    let mut url = Url::parse(url_base)?;
    let mut path = url.path().trim_end_matches('/').to_string();
    for suffix in ["/api/v1", "/api/v2"] {
        if let Some(stripped) = path.strip_suffix(suffix) {
            path = stripped.to_string();
        }
    }
    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);
    Ok((url, path))
}

struct ClientInner {
    url_base: Url,
    path_base: String,
    retry_count: u32,
    retry_interval: Duration,
    auth: Arc<Auth>,
    instrumentor: Arc<Collection>,
    transport: Arc<dyn Transport>,
    connection: Arc<Mutex<Arc<dyn Transport>>>,
}

/// Shared handle to the API. Clones share the connection and its lock.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url_base", &self.inner.url_base.as_str())
            .field("path_base", &self.inner.path_base)
            .field("retry_count", &self.inner.retry_count)
            .field("retry_interval", &self.inner.retry_interval)
            .finish()
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn url_base(&self) -> &Url {
        &self.inner.url_base
    }

    pub fn path_base(&self) -> &str {
        &self.inner.path_base
    }

    pub fn retry_count(&self) -> u32 {
        self.inner.retry_count
    }

    pub fn retry_interval(&self) -> Duration {
        self.inner.retry_interval
    }

    pub fn auth(&self) -> &Auth {
        &self.inner.auth
    }

    pub fn instrumentor(&self) -> &Arc<Collection> {
        &self.inner.instrumentor
    }

    /// New client with the same configuration but its own credential and its
    /// own connection lock.
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Client {
        let inner = &self.inner;
        Client {
            inner: Arc::new(ClientInner {
                url_base: inner.url_base.clone(),
                path_base: inner.path_base.clone(),
                retry_count: inner.retry_count,
                retry_interval: inner.retry_interval,
                auth: Arc::new(Auth::with_token(access_token)),
                instrumentor: inner.instrumentor.clone(),
                transport: inner.transport.clone(),
                connection: Arc::new(Mutex::new(inner.transport.clone())),
            }),
        }
    }

    /// Exclusive access to the connection. Without `wait` a held lock fails
    /// immediately with [`ClientError::ConnectionLocked`].
    pub async fn connection(
        &self,
        wait: bool,
    ) -> Result<OwnedMutexGuard<Arc<dyn Transport>>, ClientError> {
        let lock = self.inner.connection.clone();
        if wait {
            Ok(lock.lock_owned().await)
        } else {
            lock.try_lock_owned()
                .map_err(|_| ClientError::ConnectionLocked)
        }
    }

    /// Full request path for `path`, unless it already carries the API prefix.
    pub fn build_path(&self, path: &str, api_version: ApiVersion) -> String {
        let prefix = format!("{}/api/v", self.inner.path_base);
        if path.starts_with(&prefix) {
            return path.to_string();
        }
        collapse_slashes(&format!(
            "/{}/api/v{}/{}",
            self.inner.path_base,
            api_version.number(),
            path
        ))
    }

    pub async fn request(&self, request: Request) -> Result<Value, ClientError> {
        let Request {
            method,
            path,
            params,
            api_version,
            wait,
        } = request;

        let mut url = self.inner.url_base.clone();
        url.set_path(&self.build_path(&path, api_version));

        let mut transport_request = TransportRequest::new(method, url)
            .header("Accept", "application/json")
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        match params.into_clean_value() {
            None => {}
            Some(Value::Object(map)) if map.is_empty() => {}
            Some(value) if method.uses_query() => {
                flatten_query(None, &value, &mut transport_request.query)
            }
            Some(value) => transport_request.body = Some(Body::Json(value.to_string())),
        }

        let guard = self.connection(wait).await?;
        let connection: &dyn Transport = &**guard;

        if let Some(token) = self.token(connection).await? {
            transport_request = transport_request.header("Authorization", format!("Bearer {}", token));
        }

        let attempts = if method.is_idempotent() {
            self.inner.retry_count.max(1)
        } else {
            1
        };
        let mut attempt = 1;

        loop {
            let timing = Timing::start();
            self.instrument("request.request", request_params(&transport_request), timing);

            let error = match connection.send(transport_request.clone()).await {
                Ok(response) => {
                    let mut params = identity_params(&transport_request);
                    params.insert("status".to_string(), Value::from(response.status));
                    params.insert("body".to_string(), body_value(&response.body));
                    self.instrument("request.response", params, timing);

                    if EXPECTED_STATUSES.contains(&response.status) {
                        return parse_json(&response.body);
                    }
                    ClientError::Request(RequestError::new(
                        REQUEST_FAILED,
                        &response.body,
                        response.status,
                    ))
                }
                Err(e) => ClientError::Transport(e),
            };

            if attempt < attempts && error.is_retryable() {
                warn!(
                    "{} {} failed on attempt {} of {}: {}",
                    method, transport_request.url, attempt, attempts, error
                );
                let mut params = identity_params(&transport_request);
                params.insert("attempt".to_string(), Value::from(attempt));
                params.insert("error".to_string(), Value::String(error.to_string()));
                self.instrument("request.retry", params, timing);

                attempt += 1;
                tokio::time::sleep(self.inner.retry_interval).await;
                continue;
            }

            let mut params = identity_params(&transport_request);
            params.insert("error".to_string(), Value::String(error.to_string()));
            self.instrument("request.error", params, timing);
            return Err(error);
        }
    }

    async fn token(&self, connection: &dyn Transport) -> Result<Option<String>, ClientError> {
        let auth = &self.inner.auth;
        if auth.config().is_none() {
            return Ok(auth.token(connection).await?);
        }
        let mut params = Params::new();
        params.insert("source".to_string(), Value::from("hcp"));
        Ok(self
            .inner
            .instrumentor
            .measure("auth.token", params, auth.token(connection))
            .await?)
    }

    fn instrument(&self, name: &str, params: Params, timing: Timing) {
        self.inner.instrumentor.instrument(name, params, timing);
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Value, ClientError> {
        self.request(Request::get("search").params(params.to_field()))
            .await
    }

    pub async fn authentication_token_create(
        &self,
        username: &str,
        password: &str,
        description: Option<&str>,
        code: Option<&str>,
    ) -> Result<Value, ClientError> {
        let params = Field::map([
            (
                "user",
                Field::map([("login", Field::from(username)), ("password", Field::from(password))]),
            ),
            ("token", Field::map([("description", Field::from(description))])),
            ("two_factor", Field::map([("code", Field::from(code))])),
        ]);
        self.request(Request::post("authenticate").params(params))
            .await
    }

    /// Delete the token currently in use.
    pub async fn authentication_token_delete(&self) -> Result<Value, ClientError> {
        self.request(Request::delete("authenticate")).await
    }

    pub async fn authentication_request_2fa_code(
        &self,
        username: &str,
        password: &str,
        delivery_method: &str,
    ) -> Result<Value, ClientError> {
        let params = Field::map([
            (
                "two_factor",
                Field::map([("delivery_method", Field::from(delivery_method))]),
            ),
            (
                "user",
                Field::map([("login", Field::from(username)), ("password", Field::from(password))]),
            ),
        ]);
        self.request(Request::post("two-factor/request-code").params(params))
            .await
    }

    pub async fn authentication_token_validate(&self) -> Result<Value, ClientError> {
        self.request(Request::get("authenticate")).await
    }

    pub async fn organization_get(&self, name: &str) -> Result<Value, ClientError> {
        self.request(Request::get(format!("user/{}", name))).await
    }

    pub async fn box_get(&self, username: &str, name: &str) -> Result<Value, ClientError> {
        self.request(Request::get(format!("/box/{}/{}", username, name)))
            .await
    }

    pub async fn box_create(
        &self,
        username: &str,
        name: &str,
        params: BoxParams,
    ) -> Result<Value, ClientError> {
        let params = Field::map([
            ("username", Field::from(username)),
            ("name", Field::from(name)),
            ("short_description", params.short_description),
            ("description", params.description),
            ("is_private", params.is_private),
        ]);
        self.request(Request::post("/boxes").params(params)).await
    }

    pub async fn box_update(
        &self,
        username: &str,
        name: &str,
        params: BoxParams,
    ) -> Result<Value, ClientError> {
        let params = Field::map([
            ("short_description", params.short_description),
            ("description", params.description),
            ("is_private", params.is_private),
        ]);
        self.request(Request::put(format!("/box/{}/{}", username, name)).params(params))
            .await
    }

    pub async fn box_delete(&self, username: &str, name: &str) -> Result<Value, ClientError> {
        self.request(Request::delete(format!("/box/{}/{}", username, name)))
            .await
    }

    pub async fn box_version_get(
        &self,
        username: &str,
        name: &str,
        version: &str,
    ) -> Result<Value, ClientError> {
        self.request(Request::get(version_path(username, name, version, "")))
            .await
    }

    pub async fn box_version_create(
        &self,
        username: &str,
        name: &str,
        version: &str,
        description: Field,
    ) -> Result<Value, ClientError> {
        let params = Field::map([(
            "version",
            Field::map([("version", Field::from(version)), ("description", description)]),
        )]);
        self.request(
            Request::post(format!("/box/{}/{}/versions", username, name)).params(params),
        )
        .await
    }

    pub async fn box_version_update(
        &self,
        username: &str,
        name: &str,
        version: &str,
        description: Field,
    ) -> Result<Value, ClientError> {
        let params = Field::map([(
            "version",
            Field::map([("version", Field::from(version)), ("description", description)]),
        )]);
        self.request(Request::put(version_path(username, name, version, "")).params(params))
            .await
    }

    pub async fn box_version_delete(
        &self,
        username: &str,
        name: &str,
        version: &str,
    ) -> Result<Value, ClientError> {
        self.request(Request::delete(version_path(username, name, version, "")))
            .await
    }

    pub async fn box_version_release(
        &self,
        username: &str,
        name: &str,
        version: &str,
    ) -> Result<Value, ClientError> {
        self.request(Request::put(version_path(username, name, version, "/release")))
            .await
    }

    pub async fn box_version_revoke(
        &self,
        username: &str,
        name: &str,
        version: &str,
    ) -> Result<Value, ClientError> {
        self.request(Request::put(version_path(username, name, version, "/revoke")))
            .await
    }

    pub async fn box_version_provider_get(
        &self,
        target: ProviderTarget<'_>,
    ) -> Result<Value, ClientError> {
        self.request(Request::get(target.path("")).api_version(target.api_version()))
            .await
    }

    pub async fn box_version_provider_create(
        &self,
        target: ProviderTarget<'_>,
        params: ProviderParams,
    ) -> Result<Value, ClientError> {
        self.request(
            Request::post(target.collection_path())
                .api_version(target.api_version())
                .params(provider_body(&target, params)),
        )
        .await
    }

    pub async fn box_version_provider_update(
        &self,
        target: ProviderTarget<'_>,
        params: ProviderParams,
    ) -> Result<Value, ClientError> {
        self.request(
            Request::put(target.path(""))
                .api_version(target.api_version())
                .params(provider_body(&target, params)),
        )
        .await
    }

    pub async fn box_version_provider_delete(
        &self,
        target: ProviderTarget<'_>,
    ) -> Result<Value, ClientError> {
        self.request(Request::delete(target.path("")).api_version(target.api_version()))
            .await
    }

    /// Upload information, containing an `upload_path` entry.
    pub async fn box_version_provider_upload(
        &self,
        target: ProviderTarget<'_>,
    ) -> Result<Value, ClientError> {
        self.request(Request::get(target.path("/upload")).api_version(target.api_version()))
            .await
    }

    /// Direct-to-storage upload information, containing `upload_path` and
    /// `callback` entries.
    pub async fn box_version_provider_upload_direct(
        &self,
        target: ProviderTarget<'_>,
    ) -> Result<Value, ClientError> {
        self.request(
            Request::get(target.path("/upload/direct")).api_version(target.api_version()),
        )
        .await
    }
}

fn version_path(username: &str, name: &str, version: &str, suffix: &str) -> String {
    format!("/box/{}/{}/version/{}{}", username, name, version, suffix)
}

fn provider_body(target: &ProviderTarget<'_>, params: ProviderParams) -> Field {
    let mut provider = vec![
        ("name", Field::from(target.provider)),
        ("url", params.url),
        ("checksum", params.checksum),
        ("checksum_type", params.checksum_type),
    ];
    if let Some(architecture) = target.architecture {
        provider.push(("architecture", Field::from(architecture)));
        provider.push(("default_architecture", params.default_architecture));
    }
    Field::map([("provider", Field::map(provider))])
}

fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

/// Flatten a parameter tree into query pairs, nesting as `key[sub]`.
fn flatten_query(prefix: Option<&str>, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let key = match prefix {
                    Some(prefix) => format!("{}[{}]", prefix, key),
                    None => key.clone(),
                };
                flatten_query(Some(&key), nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                let key = prefix.map(|prefix| format!("{}[]", prefix));
                flatten_query(key.as_deref(), item, out);
            }
        }
        Value::String(text) => {
            if let Some(key) = prefix {
                out.push((key.to_string(), text.clone()));
            }
        }
        other => {
            if let Some(key) = prefix {
                out.push((key.to_string(), other.to_string()));
            }
        }
    }
}

/// Response body as JSON. An empty body is an empty mapping.
pub fn parse_json(body: &str) -> Result<Value, ClientError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    trace!("Parsing {} byte response", body.len());
    Ok(serde_json::from_str(body)?)
}

fn body_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn identity_params(request: &TransportRequest) -> Params {
    let mut params = Params::new();
    params.insert("method".to_string(), Value::String(request.method.to_string()));
    params.insert("url".to_string(), Value::String(request.url.to_string()));
    if let Some(id) = request.header_value(REQUEST_ID_HEADER) {
        params.insert("identifier".to_string(), Value::String(id.to_string()));
    }
    params
}

fn request_params(request: &TransportRequest) -> Params {
    let mut params = identity_params(request);
    let headers: Map<String, Value> = request
        .headers
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    params.insert("headers".to_string(), Value::Object(headers));
    if !request.query.is_empty() {
        let query: Map<String, Value> = request
            .query
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        params.insert("query".to_string(), Value::Object(query));
    }
    if let Some(Body::Json(json)) = &request.body {
        params.insert("body".to_string(), body_value(json));
    }
    params
}
