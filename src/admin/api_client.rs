use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::traits::{AclFilter, ConsoleBackend};
use super::users::CreateUserRequest;
use crate::acl::{AclFlat, AclOverview};
use crate::config::ApiConfig;
use crate::error::{ConsoleError, Result};

/// HTTP client for the console REST API
pub struct ConsoleApiClient {
    client: Client<HttpConnector>,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

/// Error body the console returns on non-2xx responses
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub status_code: Option<u16>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeleteAclsResponse {
    #[serde(default)]
    pub matches: Vec<AclFlat>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleSummary {
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RolesResponse {
    #[serde(default)]
    pub roles: Vec<RoleSummary>,
}

impl ConsoleApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        if !config.base_url.starts_with("http://") {
            return Err(ConsoleError::Config(format!(
                "Only plain http:// console URLs are supported, got '{}'",
                config.base_url
            )));
        }

        let client = Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build_http();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET and decode a JSON body
    pub async fn get<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let body = self.make_request::<()>(Method::GET, path, None).await?;
        decode(&body)
    }

    /// POST a JSON body, ignoring whatever the server answers with
    pub async fn post<T>(&self, path: &str, body: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.make_request(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// DELETE and decode the JSON body, treating an empty body as the default
    pub async fn delete<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned + Default,
    {
        let body = self.make_request::<()>(Method::DELETE, path, None).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(R::default());
        }
        decode(&body)
    }

    async fn make_request<T>(&self, method: Method, path: &str, body: Option<&T>) -> Result<Vec<u8>>
    where
        T: Serialize,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to: {}", method, url);

        let request = Request::builder()
            .method(method)
            .uri(&url)
            .header("Content-Type", "application/json")
            .header("User-Agent", self.user_agent.as_str());

        let request_body = if let Some(body) = body {
            let json = serde_json::to_string(body)?;
            debug!("Request body: {}", json);
            Body::from(json)
        } else {
            Body::empty()
        };

        let request = request.body(request_body)?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ConsoleError::Timeout(format!("{} did not answer within {:?}", url, self.timeout)))??;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body_bytes = hyper::body::to_bytes(response.into_body()).await?;

        debug!("Response status: {}", status);
        check_status(status, &body_bytes, retry_after)?;
        Ok(body_bytes.to_vec())
    }
}

fn decode<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    Ok(serde_json::from_slice(body)?)
}

/// Map a response status to an error, surfacing the server's message as-is.
fn check_status(status: StatusCode, body: &[u8], retry_after: Option<u64>) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            let raw = String::from_utf8_lossy(body).trim().to_string();
            if raw.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                raw
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => Err(ConsoleError::AuthenticationFailed(message)),
        StatusCode::FORBIDDEN => Err(ConsoleError::AuthorizationFailed(message)),
        StatusCode::NOT_FOUND => Err(ConsoleError::NotFound(message)),
        StatusCode::TOO_MANY_REQUESTS => Err(ConsoleError::Api {
            status: status.as_u16(),
            message: format!(
                "{} (retry after {}s)",
                message,
                retry_after.unwrap_or(60)
            ),
        }),
        _ => {
            error!("Console API returned HTTP {}: {}", status.as_u16(), message);
            Err(ConsoleError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn encode_query(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub mod urlencoding {
    /// Percent-encode everything outside the RFC 3986 unreserved set.
    pub fn encode(input: &str) -> String {
        input
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{:02X}", b),
            })
            .collect()
    }
}

#[async_trait]
impl ConsoleBackend for ConsoleApiClient {
    async fn list_acls(&self) -> Result<AclOverview> {
        self.get("/api/acls").await
    }

    async fn create_acl(&self, acl: &AclFlat) -> Result<()> {
        debug!(
            "Creating ACL {} {} {} on {}:{}",
            acl.principal, acl.permission_type, acl.operation, acl.resource_type, acl.resource_name
        );
        self.post("/api/acls", acl).await
    }

    async fn delete_acls(&self, filter: &AclFilter) -> Result<Vec<AclFlat>> {
        let path = format!("/api/acls?{}", encode_query(&filter.query_pairs()));
        let response: DeleteAclsResponse = self.delete(&path).await?;
        info!("Deleted {} ACLs matching {:?}", response.matches.len(), filter.principal);
        Ok(response.matches)
    }

    async fn list_service_accounts(&self) -> Result<Vec<String>> {
        let response: UsersResponse = self.get("/api/users").await?;
        Ok(response.users)
    }

    async fn create_service_account(&self, request: &CreateUserRequest) -> Result<()> {
        self.post("/api/users", request).await
    }

    async fn delete_service_account(&self, username: &str) -> Result<()> {
        let path = format!("/api/users/{}", urlencoding::encode(username));
        let _: serde_json::Value = self.delete(&path).await?;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<String>> {
        let response: RolesResponse = self.get("/api/roles").await?;
        Ok(response.roles.into_iter().map(|r| r.name).collect())
    }
}
