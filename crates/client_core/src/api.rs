//! Thin REST client for the task/sentence/auth backend.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Sentence, TaskId, UserSummary},
    protocol::{
        ApiEnvelope, ApiMessage, AuthResponse, CreateSentenceRequest, CreateTaskRequest,
        CreatedTask, LoginRequest, RevisionUpdateRequest, SentenceFilter, SignupRequest,
        StudentResultsRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, Result};

pub const LOGIN_ROUTE: &str = "/api/v1/users/login";
pub const LOGOUT_ROUTE: &str = "/api/v1/users/logout";
pub const SIGNUP_ROUTE: &str = "/api/v1/users/signup";
pub const SENTENCES_ROUTE: &str = "/api/v1/sentences";
pub const TASKS_ROUTE: &str = "/api/v1/tasks";
pub const RESULTS_ROUTE: &str = "/api/v1/results";
pub const REVISIONS_ROUTE: &str = "/api/v1/revisions";

/// Backend operations the controllers depend on.
#[async_trait]
pub trait TrainerApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<UserSummary>;
    async fn logout(&self) -> Result<()>;
    async fn signup(&self, request: &SignupRequest) -> Result<UserSummary>;
    async fn create_sentence(&self, request: &CreateSentenceRequest) -> Result<Sentence>;
    async fn search_sentences(&self, filter: &SentenceFilter) -> Result<Vec<Sentence>>;
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreatedTask>;
    async fn delete_task(&self, task_id: TaskId) -> Result<()>;
    async fn send_results(&self, request: &StudentResultsRequest) -> Result<()>;
    async fn update_revision(&self, request: &RevisionUpdateRequest) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|source| ClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "api request");
        Ok(self.http.request(method, url))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.request(method, path)?.json(body).send().await?;
        decode_envelope(response).await
    }

    async fn send_without_body(&self, method: Method, path: &str) -> Result<()> {
        let response = self.request(method, path)?.send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl TrainerApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<UserSummary> {
        let body: AuthResponse = self.send_json(Method::POST, LOGIN_ROUTE, request).await?;
        Ok(body.user)
    }

    async fn logout(&self) -> Result<()> {
        self.send_without_body(Method::GET, LOGOUT_ROUTE).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<UserSummary> {
        let body: AuthResponse = self.send_json(Method::POST, SIGNUP_ROUTE, request).await?;
        Ok(body.user)
    }

    async fn create_sentence(&self, request: &CreateSentenceRequest) -> Result<Sentence> {
        self.send_json(Method::POST, SENTENCES_ROUTE, request).await
    }

    async fn search_sentences(&self, filter: &SentenceFilter) -> Result<Vec<Sentence>> {
        let response = self
            .request(Method::GET, SENTENCES_ROUTE)?
            .query(filter)
            .send()
            .await?;
        decode_envelope(response).await
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreatedTask> {
        self.send_json(Method::POST, TASKS_ROUTE, request).await
    }

    async fn delete_task(&self, task_id: TaskId) -> Result<()> {
        self.send_without_body(Method::DELETE, &format!("{TASKS_ROUTE}/{task_id}"))
            .await
    }

    async fn send_results(&self, request: &StudentResultsRequest) -> Result<()> {
        let response = self
            .request(Method::POST, RESULTS_ROUTE)?
            .json(request)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    async fn update_revision(&self, request: &RevisionUpdateRequest) -> Result<()> {
        let response = self
            .request(
                Method::PATCH,
                &format!("{REVISIONS_ROUTE}/{}", request.sentence),
            )?
            .json(request)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiMessage>(&body) {
        Ok(parsed) if !parsed.message.trim().is_empty() => parsed.message,
        _ => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16())),
    };
    warn!(status = status.as_u16(), %message, "api request rejected");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    let envelope: ApiEnvelope<T> =
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))?;
    Ok(envelope.data)
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
