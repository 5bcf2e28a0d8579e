//! HTTP client for the DadScape diary service.
//!
//! Requests carry the API key as a bearer token and JSON bodies. Responses
//! are unwrapped from the `{success, data, error, message}` envelope.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::error::SyncError;
use super::protocol::{ApiResponse, CreateDiaryRequest, MotdRequest, UpdateDiaryRequest};
use super::remote::RemoteApi;
use crate::models::Diary;

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ApiClient {
    endpoint: String,
    api_key: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, SyncError> {
        if endpoint.trim().is_empty() || api_key.trim().is_empty() {
            return Err(SyncError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::HttpError(e.to_string()))?;
        Ok(Self {
            endpoint,
            api_key,
            timeout,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        let base = if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")
        {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::Timeout(self.timeout)
            } else {
                SyncError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %body, "Request failed");
            return Err(SyncError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn send_for<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = self.send(request).await?;
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| SyncError::DecodeError(e.to_string()))?;
        envelope.into_data()
    }

    pub async fn get_diaries(&self) -> Result<Vec<Diary>, SyncError> {
        let diaries: Vec<Diary> = self
            .send_for(self.request(Method::GET, "/api/diaries"))
            .await?;
        tracing::info!(count = diaries.len(), "Fetched diaries from API");
        Ok(diaries)
    }

    pub async fn post_diary(&self, diary: &Diary, rsn: &str) -> Result<Diary, SyncError> {
        let body = CreateDiaryRequest::new(diary, rsn);
        let created: Diary = self
            .send_for(self.request(Method::POST, "/api/diaries").json(&body))
            .await?;
        tracing::info!(name = %created.name, "Created diary via API");
        Ok(created)
    }

    pub async fn put_diary(&self, diary: &Diary, rsn: &str) -> Result<Diary, SyncError> {
        let body = UpdateDiaryRequest::new(diary, rsn);
        let path = format!("/api/diaries/{}", diary.id);
        let updated: Diary = self
            .send_for(self.request(Method::PUT, &path).json(&body))
            .await?;
        tracing::info!(name = %updated.name, "Updated diary via API");
        Ok(updated)
    }

    pub async fn remove_diary(&self, id: Uuid, rsn: &str) -> Result<(), SyncError> {
        let path = format!("/api/diaries/{}?rsn={}", id, urlencoding::encode(rsn));
        self.send(self.request(Method::DELETE, &path)).await?;
        tracing::info!(%id, "Deleted diary via API");
        Ok(())
    }

    pub async fn get_motd(&self) -> Result<String, SyncError> {
        self.send_for(self.request(Method::GET, "/api/motd")).await
    }

    pub async fn post_motd(&self, motd: &str, rsn: &str) -> Result<(), SyncError> {
        let body = MotdRequest { motd, rsn };
        self.send(self.request(Method::POST, "/api/motd").json(&body))
            .await?;
        tracing::info!("Updated MOTD via API");
        Ok(())
    }

    /// Whether the service answers an authenticated request.
    pub async fn check(&self) -> bool {
        match self.send(self.request(Method::GET, "/api/motd")).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Service check failed");
                false
            }
        }
    }
}

impl RemoteApi for ApiClient {
    fn fetch_diaries(&self) -> BoxFuture<'_, Result<Vec<Diary>, SyncError>> {
        Box::pin(self.get_diaries())
    }

    fn create_diary<'a>(
        &'a self,
        diary: &'a Diary,
        rsn: &'a str,
    ) -> BoxFuture<'a, Result<Diary, SyncError>> {
        Box::pin(self.post_diary(diary, rsn))
    }

    fn update_diary<'a>(
        &'a self,
        diary: &'a Diary,
        rsn: &'a str,
    ) -> BoxFuture<'a, Result<Diary, SyncError>> {
        Box::pin(self.put_diary(diary, rsn))
    }

    fn delete_diary<'a>(&'a self, id: Uuid, rsn: &'a str) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(self.remove_diary(id, rsn))
    }

    fn fetch_motd(&self) -> BoxFuture<'_, Result<String, SyncError>> {
        Box::pin(self.get_motd())
    }

    fn update_motd<'a>(
        &'a self,
        motd: &'a str,
        rsn: &'a str,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(self.post_motd(motd, rsn))
    }
}
