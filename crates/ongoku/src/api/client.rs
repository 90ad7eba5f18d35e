//! HTTP client for the project service.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::{ApiError, Result};
use super::types::{
    GitToken, GitTokenResponse, ProjectIdentity, ProjectListResponse, SchemaPullResponse,
    SchemaPushRequest, SchemaPushResponse,
};
use super::{GitTokenIssuer, ProjectDirectory, SchemaTransport};
use crate::schema::SchemaDocument;

/// Maximum length for error bodies carried in [`ApiError::Status`].
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("ongoku/", env!("CARGO_PKG_VERSION"));

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    }
}

/// Client for the project service REST API.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl ApiClient {
    /// Creates a client for `base_url`. Requests carry `token` as a bearer
    /// credential when one is given.
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        // Url::join drops the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        // Every endpoint needs an account token.
        if !self.has_token() {
            return Err(ApiError::AuthenticationRequired);
        }
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthenticationRequired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ProjectDirectory for ApiClient {
    async fn list_projects(&self) -> Result<Vec<ProjectIdentity>> {
        let url = self.endpoint("projects")?;
        debug!("GET {}", url);

        let response = self.send(self.client.get(url)).await?;
        let projects = Self::decode::<ProjectListResponse>(response)
            .await?
            .into_projects();

        debug!("Listed {} projects", projects.len());
        Ok(projects)
    }
}

#[async_trait]
impl GitTokenIssuer for ApiClient {
    async fn issue_git_token(&self, project_id: &str) -> Result<GitToken> {
        let url = self.endpoint(&format!("projects/{}/git-token", project_id))?;
        debug!("POST {}", url);

        let response = self.send(self.client.post(url)).await?;
        let token: GitToken = Self::decode::<GitTokenResponse>(response).await?.into();

        info!("Issued repository token for project {}", project_id);
        Ok(token)
    }
}

#[async_trait]
impl SchemaTransport for ApiClient {
    async fn push_schema(
        &self,
        project_id: &str,
        document: &SchemaDocument,
        skip_commit: bool,
    ) -> Result<SchemaPushResponse> {
        let url = self.endpoint(&format!("projects/{}/schema", project_id))?;
        debug!("POST {} (skipCommit={})", url, skip_commit);

        let body = SchemaPushRequest {
            schema: document,
            skip_commit,
        };
        let response = self.send(self.client.post(url).json(&body)).await?;
        Self::decode(response).await
    }

    async fn pull_schema(&self, project_id: &str) -> Result<SchemaDocument> {
        let url = self.endpoint(&format!("projects/{}/schema", project_id))?;
        debug!("GET {}", url);

        let response = self.send(self.client.get(url)).await?;
        Ok(Self::decode::<SchemaPullResponse>(response)
            .await?
            .into_document())
    }
}
