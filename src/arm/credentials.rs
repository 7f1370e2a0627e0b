//! ARM credential resolution.
//!
//! A bearer token is either supplied directly or obtained from Azure AD with
//! the OAuth2 client-credentials grant of a service principal.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{ArmError, ConfigError, ProviderError, Result};

/// Environment variable holding a pre-issued access token.
pub const ENV_ACCESS_TOKEN: &str = "ARM_ACCESS_TOKEN";

/// Environment variable holding the Azure AD tenant.
pub const ENV_TENANT_ID: &str = "ARM_TENANT_ID";

/// Environment variable holding the service principal client ID.
pub const ENV_CLIENT_ID: &str = "ARM_CLIENT_ID";

/// Environment variable holding the service principal secret.
pub const ENV_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";

/// A token is renewed this long before it expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// How the client authenticates against ARM.
#[derive(Clone)]
pub enum Credentials {
    /// A bearer token obtained elsewhere.
    AccessToken(String),
    /// A service principal exchanged for a token.
    ClientSecret {
        /// Azure AD tenant ID.
        tenant_id: String,
        /// Application (client) ID.
        client_id: String,
        /// Client secret.
        client_secret: String,
    },
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// A bearer token and, for exchanged tokens, when it stops being valid.
#[derive(Clone)]
pub struct BearerToken {
    /// Token value.
    pub value: String,
    /// Expiry, if known.
    pub expires_at: Option<Instant>,
}

impl BearerToken {
    /// Returns true while the token is not close to expiring.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.expires_at
            .is_none_or(|at| Instant::now() + REFRESH_MARGIN < at)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Returns the OAuth2 scope of a management endpoint.
#[must_use]
pub fn management_scope(endpoint: &str) -> String {
    format!("{}/.default", endpoint.trim_end_matches('/'))
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(***)"),
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    /// Resolves credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a token nor a complete service principal
    /// is configured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a token nor a complete service principal
    /// is available.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = present(ENV_ACCESS_TOKEN) {
            debug!("Using access token from {ENV_ACCESS_TOKEN}");
            return Ok(Self::AccessToken(token));
        }

        let missing = |name: &str| {
            ProviderError::Config(ConfigError::MissingEnvVar {
                name: name.to_string(),
            })
        };

        let principal = [ENV_TENANT_ID, ENV_CLIENT_ID, ENV_CLIENT_SECRET];
        if principal.into_iter().all(|name| present(name).is_none()) {
            return Err(missing(ENV_ACCESS_TOKEN));
        }

        let tenant_id = present(ENV_TENANT_ID).ok_or_else(|| missing(ENV_TENANT_ID))?;
        let client_id = present(ENV_CLIENT_ID).ok_or_else(|| missing(ENV_CLIENT_ID))?;
        let client_secret =
            present(ENV_CLIENT_SECRET).ok_or_else(|| missing(ENV_CLIENT_SECRET))?;

        Ok(Self::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        })
    }

    /// Returns a bearer token for `scope`, exchanging the service principal
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the token request fails or is rejected.
    pub async fn bearer_token(
        &self,
        http: &Client,
        authority: &str,
        scope: &str,
    ) -> Result<BearerToken> {
        match self {
            Self::AccessToken(token) => Ok(BearerToken {
                value: token.clone(),
                expires_at: None,
            }),
            Self::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => {
                let url = format!(
                    "{}/{tenant_id}/oauth2/v2.0/token",
                    authority.trim_end_matches('/')
                );
                info!("Requesting ARM token for client {client_id}");

                let response = http
                    .post(&url)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", scope),
                    ])
                    .send()
                    .await
                    .map_err(|e| ArmError::network(format!("Token request failed: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Arm(ArmError::AuthenticationFailed {
                        message: format!("token endpoint returned {status}: {body}"),
                    }));
                }

                let token: TokenResponse = response.json().await.map_err(|e| {
                    ArmError::InvalidResponse {
                        message: format!("Failed to parse token response: {e}"),
                    }
                })?;

                Ok(BearerToken {
                    value: token.access_token,
                    expires_at: token
                        .expires_in
                        .map(|secs| Instant::now() + Duration::from_secs(secs)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_access_token_wins() {
        let creds = Credentials::from_lookup(lookup(&[
            (ENV_ACCESS_TOKEN, "tok"),
            (ENV_CLIENT_ID, "id"),
        ]))
        .unwrap();

        assert!(matches!(creds, Credentials::AccessToken(ref t) if t == "tok"));
        assert_eq!(format!("{creds:?}"), "AccessToken(***)");
    }

    #[test]
    fn test_service_principal() {
        let creds = Credentials::from_lookup(lookup(&[
            (ENV_TENANT_ID, "tenant"),
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
        ]))
        .unwrap();

        assert!(matches!(creds, Credentials::ClientSecret { .. }));
        assert!(!format!("{creds:?}").contains("secret\""));
    }

    #[test]
    fn test_incomplete_service_principal() {
        let err = Credentials::from_lookup(lookup(&[(ENV_CLIENT_ID, "id")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TENANT_ID));

        let err = Credentials::from_lookup(lookup(&[
            (ENV_TENANT_ID, "tenant"),
            (ENV_CLIENT_SECRET, "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_CLIENT_ID));
        assert!(!err.to_string().contains(ENV_ACCESS_TOKEN));

        let err = Credentials::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_ACCESS_TOKEN));
    }

    #[test]
    fn test_scope_follows_endpoint() {
        assert_eq!(
            management_scope("https://management.azure.com"),
            "https://management.azure.com/.default"
        );
        assert_eq!(
            management_scope("https://management.usgovcloudapi.net/"),
            "https://management.usgovcloudapi.net/.default"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_freshness() {
        let static_token = BearerToken {
            value: String::from("tok"),
            expires_at: None,
        };
        assert!(static_token.is_fresh());

        let exchanged = BearerToken {
            value: String::from("tok"),
            expires_at: Some(Instant::now() + Duration::from_secs(3600)),
        };
        assert!(exchanged.is_fresh());
        assert!(!format!("{exchanged:?}").contains("tok\""));

        tokio::time::advance(Duration::from_secs(3541)).await;
        assert!(!exchanged.is_fresh());
    }
}
