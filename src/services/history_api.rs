use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::core::config::{DownloadPath, Settings};
use crate::schemas::history::{
    HistoryDetail, HistoryRecord, ReEvaluateRequest, ReEvaluateResponse, RecordId,
};
use crate::schemas::pagination::{HistoryListing, HistoryQuery};
use crate::schemas::Envelope;
use crate::services::auth::AuthSession;


#[derive(Debug, Error)]
pub(crate) enum ClientError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("response is missing {0}")]
    MissingField(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),
    #[error("cannot build endpoint url from {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Backend operations behind the history page.
#[async_trait]
pub(crate) trait HistoryApi: Send + Sync {
    async fn list_history(&self, query: HistoryQuery) -> Result<HistoryListing, ClientError>;

    async fn get_history_detail(&self, id: &RecordId) -> Result<HistoryDetail, ClientError>;

    async fn delete_history(&self, id: &RecordId) -> Result<(), ClientError>;

    /// Raw bytes of a submitted file.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ClientError>;

    /// Grades one submitted file again; the backend stores the new result.
    async fn re_evaluate(&self, request: &ReEvaluateRequest) -> Result<(), ClientError>;
}

pub(crate) struct HttpHistoryApi {
    client: Client,
    base_url: Url,
    download_path: DownloadPath,
    session: Arc<dyn AuthSession>,
}

impl HttpHistoryApi {
    pub(crate) fn from_settings(
        settings: &Settings,
        session: Arc<dyn AuthSession>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.api().request_timeout_seconds))
            .build()
            .context("Failed to build history API HTTP client")?;

        Ok(Self::new(
            client,
            settings.api().base_url.clone(),
            settings.api().download_path.clone(),
            session,
        ))
    }

    pub(crate) fn new(
        client: Client,
        base_url: Url,
        download_path: DownloadPath,
        session: Arc<dyn AuthSession>,
    ) -> Self {
        Self { client, base_url, download_path, session }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let raw_body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&raw_body)
                .map(|parsed| extract_error_message(&parsed))
                .unwrap_or(raw_body);
            return Err(ClientError::Status { status: status.as_u16(), detail });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ClientError> {
        let response = self.send(request).await?;
        let raw_body = response.text().await?;
        if raw_body.trim().is_empty() {
            return Ok(Envelope::empty());
        }

        let envelope: Envelope<T> = serde_json::from_str(&raw_body)?;

        if envelope.rejected() {
            return Err(ClientError::Rejected(envelope.failure_message()));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl HistoryApi for HttpHistoryApi {
    async fn list_history(&self, query: HistoryQuery) -> Result<HistoryListing, ClientError> {
        query.validate()?;

        let url = self.endpoint(&["history"])?;
        let envelope: Envelope<Vec<HistoryRecord>> =
            self.send_json(self.client.get(url).query(&query)).await?;

        let records = envelope.data.ok_or(ClientError::MissingField("data"))?;
        let total = match envelope.pagination.and_then(|info| info.total) {
            Some(total) => total,
            None => {
                tracing::warn!(
                    page = query.page,
                    rows = records.len(),
                    "History listing has no pagination total; counting loaded rows"
                );
                u64::from(query.page - 1) * u64::from(query.limit) + records.len() as u64
            }
        };

        Ok(HistoryListing { records, total })
    }

    async fn get_history_detail(&self, id: &RecordId) -> Result<HistoryDetail, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["history", &id])?;
        let envelope: Envelope<HistoryDetail> = self.send_json(self.client.get(url)).await?;

        envelope.data.ok_or(ClientError::MissingField("data"))
    }

    async fn delete_history(&self, id: &RecordId) -> Result<(), ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["history", &id])?;
        let _: Envelope<Value> = self.send_json(self.client.delete(url)).await?;

        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(&self.download_path.segments(file_id))?;
        let response = self.send(self.client.get(url)).await?;
        let payload = response.bytes().await?;

        Ok(payload.to_vec())
    }

    async fn re_evaluate(&self, request: &ReEvaluateRequest) -> Result<(), ClientError> {
        request.validate()?;

        let url = self.endpoint(&["reevaluate"])?;
        let response = self.send(self.client.post(url).json(request)).await?;
        let raw_body = response.text().await?;
        let reply: ReEvaluateResponse = serde_json::from_str(&raw_body)?;

        if !reply.success {
            let reason = reply.error.unwrap_or_else(|| "re-evaluation failed".to_string());
            return Err(ClientError::Rejected(reason));
        }

        tracing::debug!(file_id = %request.file_id, result = ?reply.result, "File re-evaluated");
        Ok(())
    }
}

fn extract_error_message(payload: &Value) -> String {
    if let Some(detail) = payload.get("detail") {
        if let Some(text) = detail.as_str() {
            return text.to_string();
        }
        if let Some(items) = detail.as_array() {
            let joined = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return joined;
            }
        }
    }

    payload
        .get("error")
        .and_then(Value::as_str)
        .or_else(|| payload.get("message").and_then(Value::as_str))
        .unwrap_or("unknown_error")
        .to_string()
}
