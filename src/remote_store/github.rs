//! GitHub contents API backend for [`ContentApi`].
//!
//! Every entry is a file in one branch of one repository. The blob SHA is the
//! version token: creates omit it (so an existing file is rejected) and deletes
//! must present the current one.

use super::content_api::{ContentApi, EntryContent, EntryKind, RemoteEntry};
use crate::configuration::types::RemoteConfig;
use crate::error_handling::types::RemoteStoreError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
}

impl ContentItem {
    fn into_entry(self) -> RemoteEntry {
        let kind = match self.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        };
        RemoteEntry {
            name: self.name,
            path: self.path,
            kind,
            version: self.sha,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: ContentItem,
}

/// Which call produced a non-success status; 422 means different things.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Read,
    Create,
    Delete,
}

pub struct GitHubContentApi {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: Option<String>,
}

impl GitHubContentApi {
    /// `token` is usually `RemoteConfig::resolved_token()`. Without one every
    /// call fails with `Unauthorized` before touching the network.
    pub fn new(config: &RemoteConfig, token: Option<String>) -> Result<Self, RemoteStoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("sitecycle"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        info!(
            "GitHub content store: {}/{}@{} via {}",
            config.owner, config.repo, config.branch, config.api_base
        );
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteStoreError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| RemoteStoreError::Unauthorized(String::from("no GitHub token configured")))?;
        Ok(self
            .client
            .request(method, self.contents_url(path))
            .bearer_auth(token))
    }
}

#[async_trait]
impl ContentApi for GitHubContentApi {
    async fn list_dir(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteStoreError> {
        let response = self
            .request(Method::GET, dir)?
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Remote directory '{}' does not exist yet", dir);
            return Ok(Vec::new());
        }
        let response = check_status(response, dir, Operation::Read).await?;
        let items: Vec<ContentItem> = response.json().await.map_err(|e| {
            RemoteStoreError::InvalidResponse(format!("listing '{}' is not a directory: {}", dir, e))
        })?;
        debug!("Listed {} remote entries under '{}'", items.len(), dir);
        Ok(items.into_iter().map(ContentItem::into_entry).collect())
    }

    async fn get_entry(&self, path: &str) -> Result<EntryContent, RemoteStoreError> {
        let response = self
            .request(Method::GET, path)?
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;
        let response = check_status(response, path, Operation::Read).await?;
        let item: ContentItem = response
            .json()
            .await
            .map_err(|e| RemoteStoreError::InvalidResponse(format!("entry '{}': {}", path, e)))?;

        // large files come back without inline content; the sha is still valid
        let content = match item.content.as_deref() {
            Some(encoded) => {
                let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
                STANDARD.decode(compact).map_err(|e| {
                    RemoteStoreError::InvalidResponse(format!("entry '{}' content: {}", path, e))
                })?
            }
            None => Vec::new(),
        };

        Ok(EntryContent {
            path: item.path,
            content,
            version: item.sha,
        })
    }

    async fn create_entry(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<RemoteEntry, RemoteStoreError> {
        let body = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": self.branch,
        });
        let response = self.request(Method::PUT, path)?.json(&body).send().await?;
        let response = check_status(response, path, Operation::Create).await?;
        let written: WriteResponse = response
            .json()
            .await
            .map_err(|e| RemoteStoreError::InvalidResponse(format!("create '{}': {}", path, e)))?;
        debug!("Created remote entry {} ({} bytes)", path, content.len());
        Ok(written.content.into_entry())
    }

    async fn delete_entry(
        &self,
        path: &str,
        version: &str,
        message: &str,
    ) -> Result<(), RemoteStoreError> {
        let body = json!({
            "message": message,
            "sha": version,
            "branch": self.branch,
        });
        let response = self
            .request(Method::DELETE, path)?
            .json(&body)
            .send()
            .await?;
        check_status(response, path, Operation::Delete).await?;
        debug!("Deleted remote entry {}", path);
        Ok(())
    }
}

async fn check_status(
    response: Response,
    path: &str,
    operation: Operation,
) -> Result<Response, RemoteStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body);
    let detail = format!("{}: {}", path, message);

    Err(match (status, operation) {
        (StatusCode::UNAUTHORIZED, _) | (StatusCode::FORBIDDEN, _) => {
            RemoteStoreError::Unauthorized(detail)
        }
        (StatusCode::NOT_FOUND, _) => RemoteStoreError::NotFound(detail),
        (StatusCode::UNPROCESSABLE_ENTITY, Operation::Create) => {
            RemoteStoreError::AlreadyExists(detail)
        }
        (StatusCode::CONFLICT, Operation::Delete)
        | (StatusCode::UNPROCESSABLE_ENTITY, Operation::Delete) => {
            RemoteStoreError::Conflict(detail)
        }
        _ => RemoteStoreError::Api {
            status: status.as_u16(),
            message: detail,
        },
    })
}
