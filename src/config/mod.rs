//! Configuration module for the backend pool provider.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `lbpool.yaml`
//! - Environment and `.env` overrides
//! - Validation of configuration values

mod spec;
mod parser;
mod validator;

pub use spec::{AzureConfig, BackendPoolConfig, ProviderConfig, StateConfig, TimeoutsConfig};
pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_API_VERSION, ENV_ENDPOINT, ENV_SUBSCRIPTION_ID,
    find_config_file,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
