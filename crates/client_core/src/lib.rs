use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::{ErrorBody, GENERIC_FAILURE_MESSAGE},
    protocol::{
        DatasetRow, ExportKind, InputMonthRequest, InputMonthResponse, InputRow, RowsResponse,
        ScoresResponse, SeedRequest, StateResponse,
    },
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod cache;
pub mod controller;
pub mod derive;
pub mod export;
pub mod store;
pub mod sync;

pub use cache::ViewCache;
pub use controller::{
    events::{DashboardEvent, UiError, UiErrorCategory, UiErrorContext},
    reducer::{reduce, DashboardState, MutationKind, MutationPhase},
};
pub use export::{ExportError, ExportTrigger};
pub use store::{RecordStore, Snapshot};
pub use sync::{
    AchievementForm, Collection, RefreshReport, SubmitOutcome, SyncController, SyncError,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to reach scoring service: {0}")]
    Transport(String),
    #[error(
        "scoring service returned HTTP {status}: {}",
        detail.as_deref().unwrap_or("no detail")
    )]
    Status { status: u16, detail: Option<String> },
    #[error("failed to decode scoring service response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Message for display: the service's own `detail` when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Request contract of the remote scoring service.
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn fetch_state(&self) -> Result<StateResponse, ServiceError>;
    async fn fetch_scores(&self) -> Result<ScoresResponse, ServiceError>;
    async fn fetch_dataset(&self) -> Result<RowsResponse<DatasetRow>, ServiceError>;
    async fn fetch_inputs(&self) -> Result<RowsResponse<InputRow>, ServiceError>;
    async fn seed(&self, request: &SeedRequest) -> Result<(), ServiceError>;
    async fn submit_input_month(
        &self,
        request: &InputMonthRequest,
    ) -> Result<InputMonthResponse, ServiceError>;
    async fn fetch_export(&self, kind: ExportKind) -> Result<Vec<u8>, ServiceError>;
}

pub struct HttpScoringService {
    http: Client,
    base_url: String,
}

impl HttpScoringService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        debug!(path, "GET scoring service");
        let res = self.http.get(self.url(path)).send().await?;
        let res = ensure_success(path, res).await?;
        Ok(res.json().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(path, "POST scoring service");
        let res = self.http.post(self.url(path)).json(body).send().await?;
        let res = ensure_success(path, res).await?;
        Ok(res.json().await?)
    }

    /// POST where only the status matters; the response body is discarded.
    async fn post_empty<B>(&self, path: &str, body: &B) -> Result<(), ServiceError>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(path, "POST scoring service");
        let res = self.http.post(self.url(path)).json(body).send().await?;
        ensure_success(path, res).await?;
        Ok(())
    }
}

async fn ensure_success(path: &str, res: Response) -> Result<Response, ServiceError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.bytes().await.unwrap_or_default();
    let detail = ErrorBody::message_from_bytes(&body);
    warn!(path, status = status.as_u16(), detail = ?detail, "scoring service rejected request");
    Err(ServiceError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl ScoringService for HttpScoringService {
    async fn fetch_state(&self) -> Result<StateResponse, ServiceError> {
        self.get_json("/state").await
    }

    async fn fetch_scores(&self) -> Result<ScoresResponse, ServiceError> {
        self.get_json("/scores").await
    }

    async fn fetch_dataset(&self) -> Result<RowsResponse<DatasetRow>, ServiceError> {
        self.get_json("/dataset").await
    }

    async fn fetch_inputs(&self) -> Result<RowsResponse<InputRow>, ServiceError> {
        self.get_json("/inputs").await
    }

    async fn seed(&self, request: &SeedRequest) -> Result<(), ServiceError> {
        self.post_empty("/seed", request).await
    }

    async fn submit_input_month(
        &self,
        request: &InputMonthRequest,
    ) -> Result<InputMonthResponse, ServiceError> {
        self.post_json("/input_month", request).await
    }

    async fn fetch_export(&self, kind: ExportKind) -> Result<Vec<u8>, ServiceError> {
        let path = kind.path();
        debug!(path, "GET export");
        let res = self.http.get(self.url(path)).send().await?;
        let res = ensure_success(path, res).await?;
        Ok(res.bytes().await?.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/fake_service.rs"]
pub(crate) mod fake_service;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
