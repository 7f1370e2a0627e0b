//! Registry of the resource types this provider serves.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ConfigError, ProviderError, Result};
use crate::schema::Schema;

use super::backend_pool::{backend_address_pool_schema, BackendAddressPoolResource, RESOURCE_TYPE};
use super::ResourceHandler;

/// A resource type: its schema and its lifecycle callbacks.
#[derive(Clone)]
pub struct ResourceDefinition {
    /// Declared fields.
    pub schema: Schema,
    /// Lifecycle callbacks.
    pub handler: Arc<dyn ResourceHandler>,
}

/// The set of resource types exposed to the host.
#[derive(Clone)]
pub struct Provider {
    resources: BTreeMap<&'static str, ResourceDefinition>,
}

impl Provider {
    /// Creates a provider with every built-in resource type registered.
    #[must_use]
    pub fn new() -> Self {
        let mut provider = Self::empty();
        provider.register(
            RESOURCE_TYPE,
            backend_address_pool_schema(),
            Arc::new(BackendAddressPoolResource::new()),
        );
        provider
    }

    /// Creates a provider with no resource types.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Registers a resource type, replacing any previous definition.
    pub fn register(
        &mut self,
        name: &'static str,
        schema: Schema,
        handler: Arc<dyn ResourceHandler>,
    ) {
        self.resources
            .insert(name, ResourceDefinition { schema, handler });
    }

    /// Looks up a resource type.
    ///
    /// # Errors
    ///
    /// Returns an error if the type is not registered.
    pub fn resource(&self, name: &str) -> Result<&ResourceDefinition> {
        self.resources.get(name).ok_or_else(|| {
            ProviderError::Config(ConfigError::validation(
                format!("unknown resource type '{name}'"),
                "resource_type",
            ))
        })
    }

    /// Returns the registered type names in order.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_resource_is_registered() {
        let provider = Provider::new();

        assert_eq!(provider.resource_types().collect::<Vec<_>>(), vec![RESOURCE_TYPE]);
        let definition = provider.resource(RESOURCE_TYPE).unwrap();
        assert!(definition.schema.field("loadbalancer_id").is_some());
    }

    #[test]
    fn test_unknown_resource_is_rejected() {
        assert!(Provider::new().resource("azurerm_lb_probe").is_err());
        assert_eq!(Provider::empty().resource_types().count(), 0);
    }
}
