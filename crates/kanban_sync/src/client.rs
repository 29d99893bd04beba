//! HTTP implementation of [`WorkApi`].

use std::time::Duration;

use async_trait::async_trait;
use entities::WorkItem;
use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use work_protocol::{
    API_BASE_PATH, CreateWork, ErrorBody, FieldError, ValidationErrors, WorkMutation, WorkPatch,
};

use crate::{ClientError, WorkApi};

/// Default per-request timeout.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the client presents its session to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCredential {
    /// `Authorization: Bearer <token>`, as mobile clients do.
    Bearer(String),
    /// Session cookie, as browsers do.
    Cookie { name: String, token: String },
}

/// Client for the work item API of a worktrack server.
#[derive(Debug, Clone)]
pub struct HttpWorkClient {
    /// Server URL, without trailing slash
    server_url: String,
    http_client: reqwest::Client,
    credential: Option<ClientCredential>,
}

impl HttpWorkClient {
    /// Creates a client with the default timeout.
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(server_url, DEFAULT_CLIENT_TIMEOUT)
    }

    /// Creates a client whose requests fail with [`ClientError::Timeout`] after `timeout`.
    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            http_client,
            credential: None,
        })
    }

    /// Authenticates every request with a bearer token.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(ClientCredential::Bearer(token.into()));
        self
    }

    /// Authenticates every request with a session cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, token: impl Into<String>) -> Self {
        self.credential = Some(ClientCredential::Cookie {
            name: name.into(),
            token: token.into(),
        });
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.server_url, API_BASE_PATH, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http_client.request(method, self.api_url(path));
        match &self.credential {
            Some(ClientCredential::Bearer(token)) => {
                builder.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            Some(ClientCredential::Cookie { name, token }) => {
                builder.header(COOKIE, format!("{name}={token}"))
            }
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = check(builder.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Deserialization(e.to_string()))
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self
            .http_client
            .get(format!("{}/health", self.server_url))
            .send()
            .await?;

        check(response).await.map(|_| ())
    }
}

/// Maps non-2xx responses onto [`ClientError`].
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    debug!(status = %status, url = %response.url(), "Request failed");
    let body = response.json::<ErrorBody>().await.ok();

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::REQUEST_TIMEOUT => ClientError::Timeout,
        StatusCode::BAD_REQUEST => ClientError::Validation(validation_errors(body)),
        _ => ClientError::Server {
            status: status.as_u16(),
            message: body
                .map(|b| b.message)
                .unwrap_or_else(|| status.to_string()),
        },
    })
}

fn validation_errors(body: Option<ErrorBody>) -> ValidationErrors {
    match body {
        Some(body) if !body.errors.is_empty() => ValidationErrors::from(body.errors),
        Some(body) => ValidationErrors::from(vec![FieldError::new("body", body.message)]),
        None => ValidationErrors::single("body", "Invalid data"),
    }
}

#[async_trait]
impl WorkApi for HttpWorkClient {
    async fn list(&self) -> Result<Vec<WorkItem>, ClientError> {
        self.send(self.request(Method::GET, "")).await
    }

    async fn create(&self, work: &CreateWork) -> Result<WorkItem, ClientError> {
        let body = WorkMutation::from(work);
        self.send(self.request(Method::POST, "/add").json(&body))
            .await
    }

    async fn update(&self, id: &str, patch: &WorkPatch) -> Result<WorkItem, ClientError> {
        let body = WorkMutation::from(patch);
        self.send(
            self.request(Method::PATCH, &format!("/update/{id}"))
                .json(&body),
        )
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/delete/{id}"))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }
}
