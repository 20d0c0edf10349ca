use std::path::Path;
use std::time::Duration;

use chat_logging::{chat_debug, chat_warn};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use crate::{ApiError, FailureKind, StoryObject, StoryRequest};

/// Key every story endpoint wraps its result array in.
const STORIES_KEY: &str = "stories_with_epics";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            // Generation calls wait on an LLM.
            request_timeout: Duration::from_secs(300),
        }
    }
}

#[async_trait::async_trait]
pub trait StoryApi: Send + Sync {
    async fn call(&self, request: &StoryRequest) -> Result<Vec<StoryObject>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStoryApi {
    base: reqwest::Url,
    client: reqwest::Client,
}

impl ReqwestStoryApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = reqwest::Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base, client })
    }

    /// Endpoint paths go under whatever path the base already has.
    fn url_for(&self, request: &StoryRequest) -> reqwest::Url {
        let mut url = self.base.clone();
        let path = format!(
            "{}{}",
            url.path().trim_end_matches('/'),
            request.endpoint().path()
        );
        url.set_path(&path);
        url
    }

    async fn build(&self, request: &StoryRequest) -> Result<reqwest::RequestBuilder, ApiError> {
        let post = self.client.post(self.url_for(request));
        let builder = match request {
            StoryRequest::Generate { vision, mvp, model } => post.json(&json!({
                "vision": vision,
                "mvp": mvp,
                "model": model,
            })),
            StoryRequest::GenerateFromFiles {
                vision_file,
                mvp_file,
                model,
            } => {
                let form = Form::new()
                    .part("vision_file", file_part(vision_file).await?)
                    .part("mvp_file", file_part(mvp_file).await?)
                    .text("model", model.clone());
                post.multipart(form)
            }
            StoryRequest::UploadCsv { file } => {
                post.multipart(Form::new().part("file", file_part(file).await?))
            }
            StoryRequest::CheckQuality {
                framework,
                stories,
                model,
            } => post.json(&json!({
                "framework": framework,
                "stories": stories,
                "model": model,
            })),
        };
        Ok(builder)
    }
}

#[async_trait::async_trait]
impl StoryApi for ReqwestStoryApi {
    async fn call(&self, request: &StoryRequest) -> Result<Vec<StoryObject>, ApiError> {
        let endpoint = request.endpoint();
        chat_debug!("POST {}", endpoint.path());

        let response = self
            .build(request)
            .await?
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            chat_warn!("{} answered {}", endpoint.path(), status);
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        parse_stories(&body)
    }
}

async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, format!("{}: {err}", path.display())))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(name))
}

/// Validates a `{stories_with_epics: [object...]}` body.
pub fn parse_stories(body: &str) -> Result<Vec<StoryObject>, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| ApiError::new(FailureKind::InvalidResponse, err.to_string()))?;
    let items = value
        .get(STORIES_KEY)
        .ok_or_else(|| {
            ApiError::new(
                FailureKind::InvalidResponse,
                format!("missing `{STORIES_KEY}`"),
            )
        })?
        .as_array()
        .ok_or_else(|| {
            ApiError::new(
                FailureKind::InvalidResponse,
                format!("`{STORIES_KEY}` is not an array"),
            )
        })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().cloned().ok_or_else(|| {
                ApiError::new(
                    FailureKind::InvalidResponse,
                    format!("story {index} is not an object"),
                )
            })
        })
        .collect()
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
