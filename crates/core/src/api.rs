use crate::error::{parse_detail, ConnectError, ConnectResult};
use crate::types::{BodyEncoding, CredentialsPayload, IntegrationItem, ProviderConfig};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Identifies whose handshake a request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectRequest {
    pub user_id: String,
    pub org_id: String,
}

impl ConnectRequest {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.into(),
        }
    }
}

/// Backend collaborator that owns the actual OAuth exchange.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn authorize(
        &self,
        config: &ProviderConfig,
        request: &ConnectRequest,
    ) -> ConnectResult<String>;

    async fn credentials(
        &self,
        config: &ProviderConfig,
        request: &ConnectRequest,
    ) -> ConnectResult<CredentialsPayload>;

    async fn load_items(
        &self,
        config: &ProviderConfig,
        credentials: &str,
    ) -> ConnectResult<Vec<IntegrationItem>>;
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("connect-hub/0.2")
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(format!("{}{}", self.base_url, path))
    }

    fn identity_body(
        builder: RequestBuilder,
        encoding: BodyEncoding,
        request: &ConnectRequest,
    ) -> RequestBuilder {
        match encoding {
            BodyEncoding::Json => builder.json(request),
            BodyEncoding::Form => builder.form(request),
        }
    }

    /// Returns the body of a 2xx response, or the backend's `detail` for
    /// anything else.
    async fn success_body(response: Response) -> ConnectResult<Result<String, Option<String>>> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(Ok(body))
        } else {
            debug!("Backend answered {}: {}", status, body);
            Ok(Err(parse_detail(&body)))
        }
    }
}

/// The authorize endpoint returns a bare URL, usually JSON-encoded as a
/// string.
pub fn parse_authorization_url(body: &str) -> ConnectResult<String> {
    let raw = serde_json::from_str::<String>(body).unwrap_or_else(|_| body.trim().to_string());
    let url = Url::parse(&raw)
        .map_err(|e| ConnectError::InvalidResponse(format!("authorization URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConnectError::InvalidResponse(format!(
            "authorization URL has unsupported scheme {}",
            url.scheme()
        )));
    }
    Ok(raw)
}

fn provider_name(config: &ProviderConfig) -> String {
    config.provider.display_name().to_string()
}

#[async_trait]
impl Backend for BackendClient {
    async fn authorize(
        &self,
        config: &ProviderConfig,
        request: &ConnectRequest,
    ) -> ConnectResult<String> {
        let builder = Self::identity_body(self.post(&config.authorize_path()), config.encoding, request);
        match Self::success_body(builder.send().await?).await? {
            Ok(body) => parse_authorization_url(&body),
            Err(detail) => Err(ConnectError::Authorize {
                provider: provider_name(config),
                detail,
            }),
        }
    }

    async fn credentials(
        &self,
        config: &ProviderConfig,
        request: &ConnectRequest,
    ) -> ConnectResult<CredentialsPayload> {
        let builder =
            Self::identity_body(self.post(&config.credentials_path()), config.encoding, request);
        match Self::success_body(builder.send().await?).await? {
            Ok(body) => {
                let value: serde_json::Value = serde_json::from_str(&body)
                    .map_err(|e| ConnectError::InvalidResponse(format!("credentials: {}", e)))?;
                CredentialsPayload::from_value(value).ok_or_else(|| {
                    ConnectError::InvalidResponse("credentials payload missing access_token".into())
                })
            }
            Err(detail) => Err(ConnectError::Credentials {
                provider: provider_name(config),
                detail,
            }),
        }
    }

    async fn load_items(
        &self,
        config: &ProviderConfig,
        credentials: &str,
    ) -> ConnectResult<Vec<IntegrationItem>> {
        let builder = self
            .post(&config.load_path())
            .form(&[("credentials", credentials)]);
        match Self::success_body(builder.send().await?).await? {
            Ok(body) => serde_json::from_str(&body)
                .map_err(|e| ConnectError::InvalidResponse(format!("items: {}", e))),
            Err(detail) => Err(ConnectError::Load {
                provider: provider_name(config),
                detail,
            }),
        }
    }
}
