use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use ws_core::{CreatedWorkspace, ErrorKind, NewWorkspace, ValidationError, Workspace, WorkspacePatch};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

pub const WORKSPACES_PATH: &str = "/api/workspaces";

/// Outcome of a mutating call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub status: u16,
    /// The record as the server returned it; `None` for a tolerated 404.
    pub workspace: Option<Workspace>,
}

impl Ack {
    /// A delete that found nothing to delete.
    pub fn gone() -> Self {
        Self {
            status: 404,
            workspace: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The workspace endpoints the harness drives.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn create(&self, data: &NewWorkspace) -> HarnessResult<String>;

    async fn find_by_name(&self, name: &str) -> HarnessResult<Vec<Workspace>>;

    async fn get(&self, id: &str) -> HarnessResult<Workspace>;

    async fn update(&self, id: &str, patch: &WorkspacePatch) -> HarnessResult<Ack>;

    async fn delete(&self, id: &str) -> HarnessResult<Ack>;
}

/// Error body the server sends: `{name, message, code, className, errors?}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Option<Value>,
}

/// Messages of a 422 body, when every one of them is a known validation message.
fn decode_violations(errors: &Value) -> Option<Vec<ValidationError>> {
    let fields = errors.as_object()?;
    let mut out = Vec::new();
    for messages in fields.values() {
        for m in messages.as_array()? {
            out.push(ValidationError::from_message(m.as_str()?)?);
        }
    }
    (!out.is_empty()).then_some(out)
}

/// reqwest-backed client; identity travels in `x-tenant-id` / `x-user-id`.
#[derive(Clone)]
pub struct HttpWorkspaceApi {
    client: Client,
    base_url: String,
    tenant: String,
    user: String,
}

impl HttpWorkspaceApi {
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        // Request deadlines are enforced by the lifecycle manager.
        let client = Client::builder()
            .connect_timeout(config.request_timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tenant: config.tenant.clone(),
            user: config.username.clone(),
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, WORKSPACES_PATH, suffix)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("x-tenant-id", &self.tenant)
            .header("x-user-id", &self.user)
    }

    /// Map a non-2xx response onto the harness taxonomy.
    async fn failure(response: Response, subject: &str) -> HarnessError {
        let status = response.status().as_u16();
        let body: ErrorBody = response.json().await.unwrap_or_default();

        match ErrorKind::from_status(status) {
            Some(ErrorKind::NotFound) => HarnessError::NotFound(subject.to_string()),
            Some(ErrorKind::Conflict) => HarnessError::DuplicateName(subject.to_string()),
            Some(ErrorKind::Unprocessable) => match body.errors.as_ref().and_then(decode_violations) {
                Some(violations) => HarnessError::Validation(violations),
                None => HarnessError::transport(Some(status), body.message),
            },
            _ => HarnessError::transport(Some(status), body.message),
        }
    }
}

#[async_trait]
impl WorkspaceApi for HttpWorkspaceApi {
    async fn create(&self, data: &NewWorkspace) -> HarnessResult<String> {
        let response = self
            .request(reqwest::Method::POST, self.url(""))
            .json(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, &data.name).await);
        }
        let created: CreatedWorkspace = response.json().await?;
        debug!(id = %created.id, name = %data.name, "workspace created");
        Ok(created.id)
    }

    async fn find_by_name(&self, name: &str) -> HarnessResult<Vec<Workspace>> {
        let response = self
            .request(reqwest::Method::GET, self.url(""))
            .query(&[("name", name)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, name).await);
        }
        Ok(response.json().await?)
    }

    async fn get(&self, id: &str) -> HarnessResult<Workspace> {
        let response = self
            .request(reqwest::Method::GET, self.url(&format!("/{id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, id).await);
        }
        Ok(response.json().await?)
    }

    async fn update(&self, id: &str, patch: &WorkspacePatch) -> HarnessResult<Ack> {
        let response = self
            .request(reqwest::Method::PUT, self.url(&format!("/{id}")))
            .json(patch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(response, id).await);
        }
        Ok(Ack {
            status: status.as_u16(),
            workspace: Some(response.json().await?),
        })
    }

    async fn delete(&self, id: &str) -> HarnessResult<Ack> {
        let response = self
            .request(reqwest::Method::DELETE, self.url(&format!("/{id}")))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Ack::gone());
        }
        if !status.is_success() {
            return Err(Self::failure(response, id).await);
        }
        Ok(Ack {
            status: status.as_u16(),
            workspace: response.json().await.ok(),
        })
    }
}
