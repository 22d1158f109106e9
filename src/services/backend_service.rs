use std::future::Future;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
}

impl BackendError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected { .. })
    }
}

/// The REST backend the roster talks to.
pub trait RosterBackend: Send + Sync + 'static {
    /// `GET /activities`: activity name -> details.
    fn fetch_activities(
        &self,
    ) -> impl Future<Output = Result<Map<String, Value>, BackendError>> + Send;

    /// `GET /activities.json`: the loose array shape, returned unparsed.
    fn fetch_loose_activities(&self) -> impl Future<Output = Result<Value, BackendError>> + Send;

    /// `POST /activities/{name}/signup?email=`; yields the server's message.
    fn signup_by_email(
        &self,
        activity: &str,
        email: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// `POST {signup_url}` with `{"activityId": ...}`.
    fn signup_by_id(
        &self,
        signup_url: &str,
        activity_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// `DELETE /activities/{name}/participants?email=`; yields the server's message.
    fn remove_participant(
        &self,
        activity: &str,
        email: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
    detail: Option<Value>,
}

impl MessageBody {
    fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    // Relative overrides such as "/signup" resolve against the base url.
    fn resolve(&self, url: &str) -> Result<Url, BackendError> {
        let base = Url::parse(&self.base_url)
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?;
        base.join(url)
            .map_err(|_| BackendError::InvalidUrl(url.to_string()))
    }

    fn participant_endpoint(&self, activity: &str, tail: &str, email: &str) -> String {
        format!(
            "{}?email={}",
            self.endpoint(&format!(
                "/activities/{}/{}",
                urlencoding::encode(activity),
                tail
            )),
            urlencoding::encode(email)
        )
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, BackendError> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                detail: non_empty(text).unwrap_or_else(|| status_text(status)),
            });
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn read_message(resp: reqwest::Response) -> Result<String, BackendError> {
        let status = resp.status();
        let body: MessageBody = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                detail: body
                    .detail_text()
                    .unwrap_or_else(|| "An error occurred".to_string()),
            });
        }
        Ok(body.message.unwrap_or_default())
    }
}

impl RosterBackend for HttpBackend {
    async fn fetch_activities(&self) -> Result<Map<String, Value>, BackendError> {
        let resp = self.client.get(self.endpoint("/activities")).send().await?;
        match Self::read_json(resp).await? {
            Value::Object(map) => Ok(map),
            other => {
                warn!(
                    "/activities returned a {} instead of an object, showing no activities",
                    kind_of(&other)
                );
                Ok(Map::new())
            }
        }
    }

    async fn fetch_loose_activities(&self) -> Result<Value, BackendError> {
        let resp = self
            .client
            .get(self.endpoint("/activities.json"))
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn signup_by_email(&self, activity: &str, email: &str) -> Result<String, BackendError> {
        let url = self.participant_endpoint(activity, "signup", email);
        let resp = self.client.post(&url).send().await?;
        Self::read_message(resp).await
    }

    async fn signup_by_id(&self, signup_url: &str, activity_id: &str) -> Result<(), BackendError> {
        let url = self.resolve(signup_url)?;
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&serde_json::json!({ "activityId": activity_id }))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = match resp.text().await {
            Ok(text) => non_empty(text),
            Err(_) => None,
        }
        .unwrap_or_else(|| status_text(status));
        Err(BackendError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    async fn remove_participant(&self, activity: &str, email: &str) -> Result<String, BackendError> {
        let url = self.participant_endpoint(activity, "participants", email);
        let resp = self.client.delete(&url).send().await?;
        Self::read_message(resp).await
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| "Signup failed".to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
