//! Resource lifecycle handlers.
//!
//! The host framework calls [`ResourceHandler::create`],
//! [`ResourceHandler::read`] and [`ResourceHandler::delete`] with the
//! resource's configuration and a [`ProviderContext`]. A handler reports
//! that a resource no longer exists by clearing the ID in the data.

mod backend_pool;
mod context;
mod provider;

pub use backend_pool::{backend_address_pool_schema, BackendAddressPoolResource, RESOURCE_TYPE};
pub use context::{ProviderContext, Timeouts};
pub use provider::{Provider, ResourceDefinition};

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::ResourceData;

/// Lifecycle callbacks of one resource type.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Creates the resource and records its ID in `data`.
    async fn create(&self, data: &mut ResourceData, ctx: &ProviderContext) -> Result<()>;

    /// Refreshes `data` from the remote resource.
    ///
    /// Clears the ID if the resource is gone. Never modifies the remote side.
    async fn read(&self, data: &mut ResourceData, ctx: &ProviderContext) -> Result<()>;

    /// Deletes the resource and clears the ID in `data`.
    async fn delete(&self, data: &mut ResourceData, ctx: &ProviderContext) -> Result<()>;
}
