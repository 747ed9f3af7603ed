//! Remote summary store: the authoritative collection the controller syncs against.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use shared::{
    domain::{Summary, SummaryId},
    error::ApiError,
    protocol::{
        AckResponse, CreateFromTextRequest, ListSummariesResponse, UpdateSummaryRequest,
        UploadQuery,
    },
};
use tracing::debug;
use url::Url;

use crate::error::StoreError;

const DEFAULT_UPLOAD_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Complete current collection; no pagination.
    async fn list_summaries(&self) -> Result<Vec<Summary>, StoreError>;
    /// Completion only: the generated record is fetched by a later list.
    async fn create_from_file(&self, upload: FileUpload) -> Result<(), StoreError>;
    async fn create_from_text(&self, text: &str) -> Result<(), StoreError>;
    async fn update_summary(&self, id: &SummaryId, text: &str) -> Result<(), StoreError>;
    async fn delete_summary(&self, id: &SummaryId) -> Result<(), StoreError>;
}

pub struct MissingSummaryStore;

#[async_trait]
impl SummaryStore for MissingSummaryStore {
    async fn list_summaries(&self) -> Result<Vec<Summary>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn create_from_file(&self, _upload: FileUpload) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn create_from_text(&self, _text: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn update_summary(&self, _id: &SummaryId, _text: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn delete_summary(&self, _id: &SummaryId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpStoreOptions {
    pub auth_token: Option<String>,
    pub request_timeout: Option<Duration>,
}

/// JSON-over-HTTP store adapter.
pub struct HttpSummaryStore {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpSummaryStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_options(base_url, HttpStoreOptions::default())
    }

    pub fn with_options(base_url: &str, options: HttpStoreOptions) -> Result<Self, StoreError> {
        let base_url = normalize_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            auth_token: options.auth_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn summary_url(&self, id: &SummaryId) -> Result<String, StoreError> {
        let mut url = Url::parse(&format!("{}/summaries", self.base_url)).map_err(|err| {
            StoreError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }
        })?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "cannot be a base".to_string(),
            })?
            .push(id.as_str());
        Ok(url.to_string())
    }

    async fn send_ack(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        id: Option<&SummaryId>,
    ) -> Result<(), StoreError> {
        let response = self.authorized(request).send().await?;
        let response = check_status(response, id).await?;
        let ack: AckResponse = response.json().await?;
        if !ack.success {
            return Err(StoreError::Unsuccessful {
                operation,
                message: ack.message.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SummaryStore for HttpSummaryStore {
    async fn list_summaries(&self) -> Result<Vec<Summary>, StoreError> {
        let response = self
            .authorized(self.http.get(format!("{}/summaries", self.base_url)))
            .send()
            .await?;
        let body: ListSummariesResponse = check_status(response, None).await?.json().await?;
        if !body.success {
            return Err(StoreError::Unsuccessful {
                operation: "list",
                message: body.message.unwrap_or_default(),
            });
        }
        debug!(count = body.summaries.len(), "store: listed summaries");
        Ok(body.summaries)
    }

    async fn create_from_file(&self, upload: FileUpload) -> Result<(), StoreError> {
        let mime_type = upload
            .mime_type
            .unwrap_or_else(|| DEFAULT_UPLOAD_MIME_TYPE.to_string());
        let request = self
            .http
            .post(format!("{}/summaries/upload", self.base_url))
            .query(&UploadQuery {
                filename: upload.filename,
                mime_type: mime_type.clone(),
            })
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(upload.bytes);
        self.send_ack("create from file", request, None).await
    }

    async fn create_from_text(&self, text: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .post(format!("{}/summaries/text", self.base_url))
            .json(&CreateFromTextRequest {
                text: text.to_string(),
            });
        self.send_ack("create from text", request, None).await
    }

    async fn update_summary(&self, id: &SummaryId, text: &str) -> Result<(), StoreError> {
        let request = self.http.put(self.summary_url(id)?).json(&UpdateSummaryRequest {
            summary: text.to_string(),
        });
        self.send_ack("update", request, Some(id)).await
    }

    async fn delete_summary(&self, id: &SummaryId) -> Result<(), StoreError> {
        let request = self.http.delete(self.summary_url(id)?);
        self.send_ack("delete", request, Some(id)).await
    }
}

fn normalize_base_url(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| StoreError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(StoreError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "base url must start with http:// or https://".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

async fn check_status(response: Response, id: Option<&SummaryId>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ApiError>(&body).ok();
    let is_not_found =
        status == StatusCode::NOT_FOUND || api_error.as_ref().is_some_and(ApiError::is_not_found);

    match (is_not_found, id) {
        (true, Some(id)) => Err(StoreError::NotFound(id.clone())),
        _ => Err(StoreError::Rejected {
            status: status.as_u16(),
            message: api_error
                .map(|err| err.message)
                .or_else(|| {
                    serde_json::from_str::<AckResponse>(&body)
                        .ok()
                        .and_then(|ack| ack.message)
                })
                .unwrap_or(body),
        }),
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
