//! HTTP client for the fleet monitoring backend.
//!
//! Thin wrapper over `reqwest` implementing the backend's JSON
//! contract: form-encoded token login, the `/dashboard` envelope, and
//! pass-through CRUD for institutions, phone banks, phones, tasks, and
//! notifications. No retry or backoff; a 401 anywhere surfaces as
//! [`ApiError::Unauthorized`] for the shell to recover from.

use crate::models::{DashboardData, DashboardResponse, TokenResponse};
use reqwest::Method;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login rejected. The message comes from the response body's
    /// `detail` field when present.
    #[error("{message}")]
    Auth { message: String },
    /// Any request other than login returned 401.
    #[error("unauthorized: the server rejected the stored credentials")]
    Unauthorized,
    /// Network failure, non-2xx response, or malformed body.
    #[error("{message}")]
    Fetch { message: String },
}

impl ApiError {
    fn fetch(message: impl Into<String>) -> Self {
        ApiError::Fetch {
            message: message.into(),
        }
    }
}

/// Client for the fleet monitoring REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
            token: None,
        }
    }

    /// Attach a bearer token carried on every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::fetch(format!(
                "request timed out after {}s",
                self.timeout_seconds
            ))
        } else if e.is_connect() {
            ApiError::fetch(format!("cannot connect to {}", self.base_url))
        } else {
            ApiError::fetch(format!("failed to send request: {}", e))
        }
    }

    /// Authenticate and obtain a bearer token.
    ///
    /// A 401 here is an authentication failure, not a session problem,
    /// so it maps to [`ApiError::Auth`] rather than `Unauthorized`.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let form = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", ""),
            ("client_id", ""),
            ("client_secret", ""),
        ];

        let response = self
            .http
            .post(self.url("auth/token"))
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth {
                message: login_failure_message(&body),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ApiError::fetch(format!("failed to parse token response: {}", e)))
    }

    /// Fetch summary and institution tree.
    pub async fn get_dashboard(&self) -> Result<DashboardData, ApiError> {
        let value = self.request(Method::GET, "dashboard", None, false).await?;
        let response: DashboardResponse = serde_json::from_value(value)
            .map_err(|e| ApiError::fetch(format!("failed to parse dashboard response: {}", e)))?;

        match response.data {
            Some(data) if response.success => Ok(data),
            _ => Err(ApiError::fetch("malformed dashboard envelope")),
        }
    }

    // --- Pass-through resources ---

    pub async fn get_institution(&self, id: u64) -> Result<Value, ApiError> {
        self.get(&format!("institutions/{}", id)).await
    }

    pub async fn list_notifications(&self) -> Result<Value, ApiError> {
        self.get("notifications").await
    }

    pub async fn toggle_task(&self, id: u64) -> Result<Value, ApiError> {
        self.post(&format!("tasks/{}/toggle", id), None).await
    }

    pub async fn execute_task(&self, id: u64) -> Result<Value, ApiError> {
        self.post(&format!("tasks/{}/execute", id), None).await
    }

    pub async fn task_logs(&self, id: u64) -> Result<Value, ApiError> {
        self.get(&format!("tasks/{}/logs", id)).await
    }

    pub async fn upload_task_media(&self, id: u64, file: &Path) -> Result<Value, ApiError> {
        self.upload(&format!("tasks/{}/upload-media", id), file).await
    }

    pub async fn upload_profile_image(&self, id: u64, file: &Path) -> Result<Value, ApiError> {
        self.upload(&format!("tasks/{}/upload-profile-image", id), file)
            .await
    }

    /// GET a resource, unwrapping a `{data: ...}` envelope if present.
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None, true).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::POST, path, body, true).await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, body, true).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None, true).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        unwrap: bool,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, &url);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        self.handle_response(response, unwrap).await
    }

    /// Send a local file as a multipart `file` field.
    async fn upload(&self, path: &str, file: &Path) -> Result<Value, ApiError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ApiError::fetch(format!("cannot read {}: {}", file.display(), e)))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let url = self.url(path);
        debug!("POST {} (multipart)", url);

        let mut builder = self.http.post(&url).multipart(form);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        self.handle_response(response, true).await
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
        unwrap: bool,
    ) -> Result<Value, ApiError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::fetch(format!("API error {}: {}", status, text)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::fetch(format!("failed to read response body: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::fetch(format!("failed to parse response body: {}", e)))?;

        Ok(if unwrap { unwrap_data(value) } else { value })
    }
}

/// Unwrap a `{data: ...}` envelope; bare bodies pass through.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Derive a user-visible login failure message from a response body.
fn login_failure_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .and_then(|d| d.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| "Login failed. Please check your credentials.".to_string())
}
