//! HTTP access to the dashboard backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::envelope::{decode_list, decode_one, error_message};
use crate::error::{DeskError, Result};
use crate::filter::FilterCriteria;
use crate::models::{DashboardStats, RecordId};
use crate::resources::{RecordAction, Resource};

const USER_AGENT_VALUE: &str = concat!("ecole-desk/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(method: HttpMethod, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// A 2xx response. Non-2xx responses are returned as [`DeskError::Http`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

/// Transport seam between the page logic and the network.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiReply>;
}

/// reqwest-backed [`Backend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| DeskError::Config(format!("invalid base_url {base_url}: {e}")))?;
        // Resource paths are joined relative to the base, so it must end with `/`.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| DeskError::Config(format!("invalid token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DeskError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| DeskError::Config(format!("invalid path {}: {e}", request.path)))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn execute(&self, request: ApiRequest) -> Result<ApiReply> {
        let url = self.url_for(&request)?;
        tracing::debug!(method = ?request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.to_reqwest(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<Value>(&text).ok()
        };

        if !(200..300).contains(&status) {
            let message = error_message(body.as_ref(), status);
            tracing::warn!(status, path = %request.path, %message, "backend returned an error");
            return Err(DeskError::Http { status, message });
        }

        Ok(ApiReply {
            status,
            body: body.unwrap_or(Value::Null),
        })
    }
}

/// `GET <resource>?<filters>`
pub async fn fetch_list<T: DeserializeOwned>(
    backend: &dyn Backend,
    resource: &Resource,
    criteria: &FilterCriteria,
) -> Result<Vec<T>> {
    let mut request = ApiRequest::get(resource.path());
    for (key, value) in criteria.query_pairs() {
        request = request.query(key, value);
    }
    let reply = backend.execute(request).await?;
    decode_list(reply.body, resource.envelope_key, reply.status)
}

/// `GET <resource>/stats`
pub async fn fetch_stats(backend: &dyn Backend, resource: &Resource) -> Result<DashboardStats> {
    let reply = backend.execute(ApiRequest::get(resource.stats_path())).await?;
    decode_one(reply.body, "stats", reply.status)
}

/// `POST <resource>` with the draft as JSON; returns the created record.
pub async fn create<T: DeserializeOwned, B: Serialize + ?Sized>(
    backend: &dyn Backend,
    resource: &Resource,
    draft: &B,
) -> Result<T> {
    let body = serde_json::to_value(draft)?;
    let reply = backend
        .execute(ApiRequest::with_body(HttpMethod::Post, resource.path(), body))
        .await?;
    decode_one(reply.body, singular(resource), reply.status)
}

/// `PUT <resource>?id=<id>`; returns the updated record.
pub async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
    backend: &dyn Backend,
    resource: &Resource,
    id: &RecordId,
    draft: &B,
) -> Result<T> {
    let body = serde_json::to_value(draft)?;
    let request =
        ApiRequest::with_body(HttpMethod::Put, resource.path(), body).query("id", id.as_str());
    let reply = backend.execute(request).await?;
    decode_one(reply.body, singular(resource), reply.status)
}

/// `DELETE <resource>?id=<id>`
pub async fn delete(backend: &dyn Backend, resource: &Resource, id: &RecordId) -> Result<()> {
    let request = ApiRequest {
        method: HttpMethod::Delete,
        ..ApiRequest::get(resource.path())
    }
    .query("id", id.as_str());
    let reply = backend.execute(request).await?;
    // `{ success: false }` with a 200 still counts as a failure.
    decode_one::<Value>(reply.body, singular(resource), reply.status).map(|_| ())
}

/// `POST <resource>?action=<name>` with `{ "id": ... }`; returns the updated record.
pub async fn run_action<T: DeserializeOwned>(
    backend: &dyn Backend,
    resource: &Resource,
    id: &RecordId,
    action: RecordAction,
) -> Result<T> {
    let request = ApiRequest::with_body(HttpMethod::Post, resource.path(), json!({ "id": id }))
        .query("action", action.as_str());
    let reply = backend.execute(request).await?;
    decode_one(reply.body, singular(resource), reply.status)
}

/// Wrapper key for single-record replies: `factures` -> `facture`.
fn singular(resource: &Resource) -> &'static str {
    resource
        .envelope_key
        .strip_suffix('s')
        .unwrap_or(resource.envelope_key)
}
