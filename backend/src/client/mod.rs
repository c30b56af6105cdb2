//! HTTP client for the portal API.
//!
//! Mirrors the browser form flow: input is checked with the same validators the
//! server uses before anything is sent, the session token is persisted through
//! a [`TokenStore`] and attached as a bearer token to protected calls.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::db::models::BatchJob;
use crate::web::models::batch_job_models::{BatchJobListResponse, StartBatchResponse};
use crate::web::models::{Claims, LoginResponse, VerifyResponse};
use crate::web::validation::{self, ValidationError};

pub mod token_store;

pub use token_store::{AUTH_TOKEN_KEY, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Request failed ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Corrupt state file: {0}")]
    CorruptState(String),
}

pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        PortalClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        match self.tokens.get_token()? {
            Some(token) if !token.is_empty() => Ok(builder.bearer_auth(token)),
            _ => Err(ClientError::NotAuthenticated),
        }
    }

    async fn read<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string();
        debug!(status = %status, message = %message, "API call failed.");
        Err(ClientError::Api { status, message })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let login = validation::validate_login(&json!({ "email": email, "password": password }))?;
        let response = self
            .http
            .post(self.url("/api/login"))
            .json(&login)
            .send()
            .await?;
        let login_response: LoginResponse = Self::read(response, "Login failed").await?;
        self.tokens.set_token(&login_response.token)?;
        Ok(login_response)
    }

    /// Submits the batch form. `form` holds the raw field values.
    pub async fn start_batch(&self, form: &Value) -> Result<BatchJob, ClientError> {
        let request = validation::validate_batch_job_request(form)?;
        let builder = self.http.post(self.url("/api/start-batch")).json(&request);
        let response = self.authorized(builder)?.send().await?;
        let started: StartBatchResponse = Self::read(response, "Failed to start batch").await?;
        Ok(started.batch_job)
    }

    pub async fn verify(&self) -> Result<Claims, ClientError> {
        let builder = self.http.get(self.url("/api/verify"));
        let response = self.authorized(builder)?.send().await?;
        let verified: VerifyResponse = Self::read(response, "Session check failed").await?;
        Ok(verified.user)
    }

    pub async fn list_batch_jobs(&self) -> Result<Vec<BatchJob>, ClientError> {
        let builder = self.http.get(self.url("/api/batch-jobs"));
        let response = self.authorized(builder)?.send().await?;
        let listed: BatchJobListResponse = Self::read(response, "Failed to list batch jobs").await?;
        Ok(listed.batch_jobs)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.tokens.remove_token()
    }

    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        self.tokens.is_authenticated()
    }
}
