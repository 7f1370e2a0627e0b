//! ARM management API client.
//!
//! This module provides the HTTP client for the `Microsoft.Network`
//! load balancer endpoints of the Azure Resource Manager REST API.

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use std::time::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{ArmError, ProviderError, Result};

use super::api::LoadBalancerApi;
use super::credentials::{management_scope, BearerToken, Credentials};
use super::types::{ArmErrorResponse, LoadBalancer, OperationHandle};

/// Default ARM endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Default Azure AD authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Network API version used for load balancer requests.
pub const DEFAULT_API_VERSION: &str = "2016-09-01";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the async operation status URL.
const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Header carrying the per-request correlation ID.
const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// ARM management API client.
#[derive(Debug, Clone)]
pub struct ArmClient {
    /// HTTP client.
    client: Client,
    /// Management endpoint, without trailing slash.
    endpoint: String,
    /// Azure AD authority for token exchange.
    authority: String,
    /// Subscription all requests are scoped to.
    subscription_id: String,
    /// API version query parameter.
    api_version: String,
    /// Credentials.
    credentials: Credentials,
    /// Token, fetched on first use and renewed before it expires.
    token: Arc<Mutex<Option<BearerToken>>>,
}

impl ArmClient {
    /// Creates a new ARM client for a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(subscription_id: &str, credentials: Credentials) -> Result<Self> {
        Self::with_timeout(subscription_id, credentials, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(
        subscription_id: &str,
        credentials: Credentials,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArmError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            subscription_id: subscription_id.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            credentials,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Points the client at a different management endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Points the client at a different Azure AD authority.
    #[must_use]
    pub fn with_authority(mut self, authority: &str) -> Self {
        self.authority = authority.trim_end_matches('/').to_string();
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Returns the subscription this client is scoped to.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Builds the URL of a load balancer.
    fn load_balancer_url(&self, resource_group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{resource_group}/providers/Microsoft.Network/loadBalancers/{name}",
            self.endpoint, self.subscription_id
        )
    }

    /// Returns the cached bearer token, acquiring a new one when it is
    /// missing or about to expire.
    async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self
            .credentials
            .bearer_token(&self.client, &self.authority, &management_scope(&self.endpoint))
            .await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Sends a request with authentication and correlation headers.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let token = self.bearer_token().await?;
        let request_id = Uuid::new_v4();
        trace!("ARM request {request_id}");

        request
            .query(&[("api-version", self.api_version.as_str())])
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(CLIENT_REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::Arm(ArmError::network(format!("Request failed: {e}"))))
    }
}

/// Converts a non-success response into an error.
async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let retry_after = if retry_after == 0 { 60 } else { retry_after };

        return ProviderError::Arm(ArmError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = serde_json::from_str::<ArmErrorResponse>(&body)
        .map_or_else(|_| (String::new(), body.clone()), |r| (r.error.code, r.error.message));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ProviderError::Arm(ArmError::AuthenticationFailed {
            message: if message.is_empty() {
                status.to_string()
            } else {
                message
            },
        });
    }

    ProviderError::Arm(ArmError::api_error(status.as_u16(), code, message))
}

/// Parses a load balancer body.
async fn parse_load_balancer(response: Response) -> Result<LoadBalancer> {
    response.json().await.map_err(|e| {
        ProviderError::Arm(ArmError::InvalidResponse {
            message: format!("Failed to parse load balancer: {e}"),
        })
    })
}

#[async_trait]
impl LoadBalancerApi for ArmClient {
    async fn get(&self, resource_group: &str, name: &str) -> Result<Option<LoadBalancer>> {
        let url = self.load_balancer_url(resource_group, name);
        debug!("GET {url}");

        let response = self.send(self.client.get(&url)).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Load balancer {name} not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        parse_load_balancer(response).await.map(Some)
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        load_balancer: &LoadBalancer,
    ) -> Result<OperationHandle> {
        let url = self.load_balancer_url(resource_group, name);
        debug!("PUT {url}");
        trace!(
            "Request body: {}",
            serde_json::to_string(load_balancer).unwrap_or_default()
        );

        let response = self
            .send(
                self.client
                    .put(&url)
                    .header(header::CONTENT_TYPE, "application/json")
                    .json(load_balancer),
            )
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let async_operation_url = response
            .headers()
            .get(ASYNC_OPERATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        // Some API versions answer 202 with an empty body.
        let body = response
            .bytes()
            .await
            .map_err(|e| ArmError::network(format!("Failed to read response: {e}")))?;
        let resource = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&body).map_err(|e| ArmError::InvalidResponse {
                message: format!("Failed to parse load balancer: {e}"),
            })?)
        };

        Ok(OperationHandle {
            status: status.as_u16(),
            async_operation_url,
            resource,
        })
    }
}
