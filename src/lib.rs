// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # lbpool
//!
//! A provider for Azure load balancer backend address pools.
//!
//! ## Overview
//!
//! A backend address pool is a child of its load balancer and has no API
//! endpoint of its own. This crate implements the create, read and delete
//! callbacks a host orchestration framework needs for the
//! `azurerm_lb_backend_address_pool` resource type:
//!
//! - Read and full-replacement update of the parent load balancer
//! - Waiting for the load balancer's provisioning state to settle
//! - Projection of the pool's computed attributes back into its state
//!
//! ## Modules
//!
//! - [`arm`]: Resource identifiers, wire types and the ARM API client
//! - [`poller`]: Provisioning-state polling with cancellation
//! - [`schema`]: Declarative resource schemas and resource data
//! - [`resource`]: Lifecycle handlers and the provider registry
//! - [`config`]: Configuration parsing and validation
//! - [`state`]: Local state storage
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! provider:
//!   subscription_id: 00000000-0000-0000-0000-000000000000
//!
//! backend_address_pools:
//!   - name: pool1
//!     location: West US
//!     resource_group_name: rg1
//!     loadbalancer_id: /subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Network/loadBalancers/lb1
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod arm;
pub mod cli;
pub mod config;
pub mod error;
pub mod poller;
pub mod resource;
pub mod schema;
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use arm::{ArmClient, Credentials, LoadBalancerApi, ResourceId};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, ProviderConfig};
pub use error::{ProviderError, Result};
pub use poller::{cancellation, CancelHandle, CancelSignal, StateWaiter};
pub use resource::{
    BackendAddressPoolResource, Provider, ProviderContext, ResourceHandler, Timeouts,
};
pub use schema::{ResourceData, Schema};
pub use state::{LocalStateStore, ProviderState, StateStore};
