//! State management module.
//!
//! This module provides persistent storage for the identifiers and last
//! observed attributes of managed resources.

mod store;
mod local;
mod types;

pub use store::StateStore;
pub use local::LocalStateStore;
pub use types::{
    LifecycleOperation, OperationHistoryEntry, ProviderState, ResourceState, STATE_VERSION,
};
