//! Client side of the announcement contract.
//!
//! [`AnnouncementClient`] talks to the HTTP API and never fails out: every
//! call resolves to an [`ApiResult`] carrying either data or an error string.
//! [`board::AnnouncementBoard`] keeps a loaded collection and derives
//! filtered pages from it, [`form::AnnouncementForm`] validates input before
//! anything is sent, and [`widgets`] hold the read-only dashboard state.

pub mod board;
pub mod filter;
pub mod form;
pub mod widgets;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    api::dto::{AnnouncementDto, ApiResponse},
    domain::{Announcement, CreateAnnouncementRequest, PinRequest, UpdateAnnouncementRequest},
};

pub use crate::api::dto::map_announcement;

const NETWORK_FALLBACK: &str = "Network error";
const SERVER_FALLBACK: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never produced a usable response.
    #[error("{0}")]
    Transport(String),

    /// The server answered with `success: false` or an error status.
    #[error("{0}")]
    Server(String),

    /// The lookup succeeded but carried no record.
    #[error("Not found")]
    NotFound,

    /// The server accepted the request but the body lacks the expected payload.
    #[error("Invalid response")]
    InvalidResponse,
}

impl ClientError {
    fn transport(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            ClientError::Transport(NETWORK_FALLBACK.to_string())
        } else {
            ClientError::Transport(message)
        }
    }
}

/// Uniform outcome of a client call: `data` on success, `error` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResult<T> {
    pub fn success(data: T) -> Self {
        Self { data: Some(data), error: None }
    }

    /// Success without a payload.
    pub fn done() -> Self {
        Self { data: None, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { data: None, error: Some(error.into()) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        ApiResult {
            data: self.data.map(f),
            error: self.error,
        }
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

impl<T> From<Result<T, ClientError>> for ApiResult<T> {
    fn from(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(data) => ApiResult::success(data),
            Err(e) => ApiResult::failure(e.to_string()),
        }
    }
}

/// Query for `GET /slide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideParams {
    pub page: u32,
    pub limit: u32,
}

/// The operations the views depend on. [`AnnouncementClient`] is the HTTP
/// implementation.
#[async_trait]
pub trait AnnouncementApi: Send + Sync {
    async fn get_all(&self) -> ApiResult<Vec<Announcement>>;
    async fn get_slides(&self, params: Option<SlideParams>) -> ApiResult<Vec<Announcement>>;
    async fn get_pinned(&self) -> ApiResult<Vec<Announcement>>;
    async fn get_public_slides(&self) -> ApiResult<Vec<Announcement>>;
    async fn get_by_id(&self, id: i64) -> ApiResult<Announcement>;
    async fn create(&self, payload: &CreateAnnouncementRequest) -> ApiResult<Announcement>;
    async fn update(&self, id: i64, payload: &UpdateAnnouncementRequest) -> ApiResult<Announcement>;
    async fn toggle_pin(&self, id: i64, pinned: bool) -> ApiResult<Announcement>;
    async fn delete_one(&self, id: i64) -> ApiResult<()>;
    async fn get_all_count(&self) -> ApiResult<i64>;
    async fn get_pinned_count(&self) -> ApiResult<i64>;
    async fn get_weekly_count(&self) -> ApiResult<i64>;
}

#[derive(Clone)]
pub struct AnnouncementClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AnnouncementClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/announcements{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and parses the envelope. Error statuses and
    /// `success: false` become [`ClientError::Server`], 404 becomes
    /// [`ClientError::NotFound`].
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ApiResponse<T>, ClientError> {
        let response = builder.send().await.map_err(ClientError::transport)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }

        let body = response.bytes().await.map_err(ClientError::transport)?;
        let envelope = match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                tracing::warn!("Malformed announcement response: {}", e);
                return Err(ClientError::InvalidResponse);
            }
            Err(_) => {
                return Err(ClientError::Server(format!("{} ({})", SERVER_FALLBACK, status)));
            }
        };

        if !status.is_success() || !envelope.success {
            let message = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| SERVER_FALLBACK.to_string());
            return Err(ClientError::Server(message));
        }

        Ok(envelope)
    }

    async fn fetch_list(&self, builder: RequestBuilder) -> Result<Vec<Announcement>, ClientError> {
        let envelope = self.send::<Vec<AnnouncementDto>>(builder).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(map_announcement)
            .collect())
    }

    /// A write that must echo the stored entity back.
    async fn fetch_written(&self, builder: RequestBuilder) -> Result<Announcement, ClientError> {
        let envelope = self.send::<AnnouncementDto>(builder).await?;
        envelope
            .data
            .map(map_announcement)
            .ok_or(ClientError::InvalidResponse)
    }

    async fn fetch_count(&self, path: &str) -> Result<i64, ClientError> {
        let envelope = self.send::<i64>(self.request(Method::GET, path)).await?;
        Ok(envelope.data.unwrap_or(0))
    }
}

#[async_trait]
impl AnnouncementApi for AnnouncementClient {
    async fn get_all(&self) -> ApiResult<Vec<Announcement>> {
        self.fetch_list(self.request(Method::GET, "")).await.into()
    }

    async fn get_slides(&self, params: Option<SlideParams>) -> ApiResult<Vec<Announcement>> {
        let mut builder = self.request(Method::GET, "/slide");
        if let Some(params) = params {
            builder = builder.query(&params);
        }
        self.fetch_list(builder).await.into()
    }

    async fn get_pinned(&self) -> ApiResult<Vec<Announcement>> {
        self.fetch_list(self.request(Method::GET, "/pinned")).await.into()
    }

    async fn get_public_slides(&self) -> ApiResult<Vec<Announcement>> {
        self.fetch_list(self.request(Method::GET, "/public")).await.into()
    }

    async fn get_by_id(&self, id: i64) -> ApiResult<Announcement> {
        let result = self
            .send::<AnnouncementDto>(self.request(Method::GET, &format!("/{}", id)))
            .await
            .and_then(|envelope| envelope.data.map(map_announcement).ok_or(ClientError::NotFound));
        result.into()
    }

    async fn create(&self, payload: &CreateAnnouncementRequest) -> ApiResult<Announcement> {
        self.fetch_written(self.request(Method::POST, "").json(payload)).await.into()
    }

    async fn update(&self, id: i64, payload: &UpdateAnnouncementRequest) -> ApiResult<Announcement> {
        let builder = self.request(Method::PUT, &format!("/{}", id)).json(payload);
        self.fetch_written(builder).await.into()
    }

    async fn toggle_pin(&self, id: i64, pinned: bool) -> ApiResult<Announcement> {
        let builder = self
            .request(Method::PATCH, &format!("/{}/pin", id))
            .json(&PinRequest { pinned });
        self.fetch_written(builder).await.into()
    }

    async fn delete_one(&self, id: i64) -> ApiResult<()> {
        match self.send::<serde_json::Value>(self.request(Method::DELETE, &format!("/{}", id))).await {
            Ok(_) => ApiResult::done(),
            Err(e) => ApiResult::failure(e.to_string()),
        }
    }

    async fn get_all_count(&self) -> ApiResult<i64> {
        self.fetch_count("/stats/count").await.into()
    }

    async fn get_pinned_count(&self) -> ApiResult<i64> {
        self.fetch_count("/stats/pinned/count").await.into()
    }

    async fn get_weekly_count(&self) -> ApiResult<i64> {
        self.fetch_count("/stats/weekly/count").await.into()
    }
}
