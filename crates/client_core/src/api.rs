use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DraftId, StyleId},
    error::ApiErrorBody,
    protocol::{
        AnalyzeStyleRequest, AnalyzeStyleResponse, Draft, GeneratePostRequest,
        GeneratePostResponse, SaveDraftRequest, SaveDraftResponse, StyleProfile,
    },
};
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::ClientError};

/// Request/response contract of the style and draft backend.
#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn list_styles(&self) -> Result<Vec<StyleProfile>, ClientError>;
    async fn delete_style(&self, style_id: &StyleId) -> Result<(), ClientError>;
    async fn analyze_style(
        &self,
        request: AnalyzeStyleRequest,
    ) -> Result<AnalyzeStyleResponse, ClientError>;
    async fn list_drafts(&self) -> Result<Vec<Draft>, ClientError>;
    async fn save_draft(&self, request: SaveDraftRequest)
        -> Result<SaveDraftResponse, ClientError>;
    async fn delete_draft(&self, draft_id: &DraftId) -> Result<(), ClientError>;
    async fn generate_posts(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClientError>;
}

pub struct HttpStudioApi {
    http: Client,
    base_url: Url,
}

impl HttpStudioApi {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.api_base_url)
            .with_context(|| format!("invalid API base url '{}'", settings.api_base_url))?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Validation(format!(
                    "API base url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Maps non-2xx responses to `ClientError::Server`, preferring the body's
/// `error` field over the generic status text.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
    Err(ClientError::Server {
        status: status.as_u16(),
        message: body.message_or_status(status.as_u16()),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::Decode(err.to_string()))
}

#[async_trait]
impl StudioApi for HttpStudioApi {
    async fn list_styles(&self) -> Result<Vec<StyleProfile>, ClientError> {
        let url = self.endpoint(&["api", "styles"])?;
        let res = self.http.get(url).send().await?;
        read_json(res).await
    }

    async fn delete_style(&self, style_id: &StyleId) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "styles", style_id.as_str()])?;
        let res = self.http.delete(url).send().await?;
        ensure_success(res).await?;
        debug!(style_id = %style_id, "style delete acknowledged");
        Ok(())
    }

    async fn analyze_style(
        &self,
        request: AnalyzeStyleRequest,
    ) -> Result<AnalyzeStyleResponse, ClientError> {
        let url = self.endpoint(&["api", "analyze-style"])?;
        let res = self.http.post(url).json(&request).send().await?;
        read_json(res).await
    }

    async fn list_drafts(&self) -> Result<Vec<Draft>, ClientError> {
        let url = self.endpoint(&["api", "drafts"])?;
        let res = self.http.get(url).send().await?;
        read_json(res).await
    }

    async fn save_draft(
        &self,
        request: SaveDraftRequest,
    ) -> Result<SaveDraftResponse, ClientError> {
        let url = self.endpoint(&["api", "drafts"])?;
        let res = self.http.post(url).json(&request).send().await?;
        read_json(res).await
    }

    async fn delete_draft(&self, draft_id: &DraftId) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "drafts", draft_id.as_str()])?;
        let res = self.http.delete(url).send().await?;
        ensure_success(res).await?;
        debug!(draft_id = %draft_id, "draft delete acknowledged");
        Ok(())
    }

    async fn generate_posts(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClientError> {
        let url = self.endpoint(&["api", "generate-post"])?;
        let res = self.http.post(url).json(&request).send().await?;
        read_json(res).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
