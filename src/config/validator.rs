//! Configuration validation.
//!
//! This module checks a parsed configuration before any request is sent,
//! collecting every problem it finds and reporting the first one as the
//! error.

use crate::arm::ResourceId;
use crate::error::{ConfigError, ProviderError, Result};
use crate::resource::backend_address_pool_schema;
use crate::schema::Schema;
use std::collections::HashSet;
use tracing::debug;

use super::spec::{AzureConfig, BackendPoolConfig, ProviderConfig, TimeoutsConfig};

/// Maximum length of an ARM resource name.
const MAX_NAME_LENGTH: usize = 80;

/// Validator for provider configurations.
#[derive(Debug)]
pub struct ConfigValidator {
    /// Schema every configured pool must satisfy.
    schema: Schema,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a validator for backend address pool configurations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: backend_address_pool_schema(),
        }
    }

    /// Validates a provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self, config: &ProviderConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_provider(&config.provider, &mut result);
        Self::validate_timeouts(&config.timeouts, &mut result);
        self.validate_pools(config, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(ProviderError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Validates connection settings.
    fn validate_provider(provider: &AzureConfig, result: &mut ValidationResult) {
        if provider.subscription_id.trim().is_empty() {
            result.push("provider.subscription_id", "Subscription ID cannot be empty");
        }

        if !provider.endpoint.starts_with("https://") && !provider.endpoint.starts_with("http://") {
            result.push(
                "provider.endpoint",
                format!("Endpoint '{}' must be an http(s) URL", provider.endpoint),
            );
        } else if provider.endpoint.starts_with("http://") {
            result
                .warnings
                .push(format!("Endpoint '{}' is not using TLS", provider.endpoint));
        }

        if provider.api_version.trim().is_empty() {
            result.push("provider.api_version", "API version cannot be empty");
        }
    }

    /// Validates operation deadlines.
    fn validate_timeouts(timeouts: &TimeoutsConfig, result: &mut ValidationResult) {
        let fields = [
            ("timeouts.create_secs", timeouts.create_secs),
            ("timeouts.delete_secs", timeouts.delete_secs),
            ("timeouts.poll_interval_secs", timeouts.poll_interval_secs),
            ("timeouts.request_secs", timeouts.request_secs),
        ];
        for (field, value) in fields {
            if value == 0 {
                result.push(field, "Timeout must be greater than zero");
            }
        }

        if timeouts.poll_interval_secs > timeouts.create_secs {
            result.push(
                "timeouts.poll_interval_secs",
                format!(
                    "Poll interval ({}s) cannot exceed the create timeout ({}s)",
                    timeouts.poll_interval_secs, timeouts.create_secs
                ),
            );
        }
    }

    /// Validates every configured pool.
    fn validate_pools(&self, config: &ProviderConfig, result: &mut ValidationResult) {
        if config.backend_address_pools.is_empty() {
            result
                .warnings
                .push(String::from("No backend address pools are configured"));
        }

        let mut seen = HashSet::new();
        for (index, pool) in config.backend_address_pools.iter().enumerate() {
            let prefix = format!("backend_address_pools[{index}]");

            if !seen.insert(pool.name.to_ascii_lowercase()) {
                result.push(
                    format!("{prefix}.name"),
                    format!("Duplicate backend address pool name '{}'", pool.name),
                );
            }

            if !pool.name.is_empty() && !is_valid_name(&pool.name) {
                result.push(
                    format!("{prefix}.name"),
                    format!(
                        "Pool name '{}' is invalid. Must be 1-80 characters of letters, digits, '_', '.' or '-', starting with a letter or digit.",
                        pool.name
                    ),
                );
            }

            if let Err(e) = self.schema.validate(&pool.to_resource_data()) {
                result.push(prefix.clone(), e.to_string());
                continue;
            }

            Self::validate_load_balancer_id(pool, &config.provider, &prefix, result);
        }
    }

    /// Checks that the load balancer ID parses and agrees with the pool.
    fn validate_load_balancer_id(
        pool: &BackendPoolConfig,
        provider: &AzureConfig,
        prefix: &str,
        result: &mut ValidationResult,
    ) {
        let field = format!("{prefix}.loadbalancer_id");
        let id = match ResourceId::parse(&pool.loadbalancer_id) {
            Ok(id) => id,
            Err(e) => {
                result.push(field, e.to_string());
                return;
            }
        };

        if id.path("loadBalancers").is_none() {
            result.push(field, format!("'{}' is not a load balancer ID", pool.loadbalancer_id));
            return;
        }

        if !id.resource_group().eq_ignore_ascii_case(&pool.resource_group_name) {
            result.push(
                format!("{prefix}.resource_group_name"),
                format!(
                    "Resource group '{}' does not match the load balancer's resource group '{}'",
                    pool.resource_group_name,
                    id.resource_group()
                ),
            );
        }

        if !id.subscription_id().eq_ignore_ascii_case(&provider.subscription_id) {
            result.warnings.push(format!(
                "Pool '{}' targets subscription '{}' but the provider is configured for '{}'",
                pool.name,
                id.subscription_id(),
                provider.subscription_id
            ));
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks an ARM resource name.
fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return false;
    }

    let Some(first) = name.chars().next() else {
        return false;
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }

    // Must end with a letter, digit or underscore
    if name.ends_with('.') || name.ends_with('-') {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

impl ValidationResult {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;

    const LB_ID: &str =
        "/subscriptions/sub-1/resourceGroups/RG1/providers/Microsoft.Network/loadBalancers/lb1";

    fn config() -> ProviderConfig {
        let yaml = format!(
            r"
provider:
  subscription_id: sub-1
backend_address_pools:
  - name: pool1
    location: westus
    resource_group_name: rg1
    loadbalancer_id: {LB_ID}
"
        );
        ConfigParser::new().parse_yaml(&yaml, None).unwrap()
    }

    fn error_field(config: &ProviderConfig) -> Option<String> {
        match ConfigValidator::new().validate(config) {
            Err(ProviderError::Config(ConfigError::ValidationError { field, .. })) => field,
            _ => None,
        }
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("pool1"));
        assert!(is_valid_name("Backend_Pool.v2"));
        assert!(is_valid_name("pool_"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("-pool"));
        assert!(!is_valid_name("pool."));
        assert!(!is_valid_name("pool/1"));
        assert!(!is_valid_name(&"p".repeat(81)));
    }

    #[test]
    fn test_valid_config_passes() {
        let result = ConfigValidator::new().validate(&config()).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_empty_subscription() {
        let mut config = config();
        config.provider.subscription_id = String::new();
        assert_eq!(error_field(&config).as_deref(), Some("provider.subscription_id"));
    }

    #[test]
    fn test_poll_interval_exceeds_create_timeout() {
        let mut config = config();
        config.timeouts.poll_interval_secs = 900;
        assert_eq!(
            error_field(&config).as_deref(),
            Some("timeouts.poll_interval_secs")
        );
    }

    #[test]
    fn test_duplicate_pool_names() {
        let mut config = config();
        let mut duplicate = config.backend_address_pools[0].clone();
        duplicate.name = String::from("POOL1");
        config.backend_address_pools.push(duplicate);

        assert_eq!(
            error_field(&config).as_deref(),
            Some("backend_address_pools[1].name")
        );
    }

    #[test]
    fn test_resource_group_mismatch() {
        let mut config = config();
        config.backend_address_pools[0].resource_group_name = String::from("rg2");
        assert_eq!(
            error_field(&config).as_deref(),
            Some("backend_address_pools[0].resource_group_name")
        );
    }

    #[test]
    fn test_unparseable_load_balancer_id() {
        let mut config = config();
        config.backend_address_pools[0].loadbalancer_id = String::from("/subscriptions/sub-1");
        assert_eq!(
            error_field(&config).as_deref(),
            Some("backend_address_pools[0].loadbalancer_id")
        );
    }

    #[test]
    fn test_plain_http_endpoint_warns() {
        let mut config = config();
        config.provider.endpoint = String::from("http://localhost:8080");
        let result = ConfigValidator::new().validate(&config).unwrap();
        assert_eq!(result.warning_count(), 1);
    }
}
