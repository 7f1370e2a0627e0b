//! Everything a lifecycle callback needs besides its own configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::arm::LoadBalancerApi;
use crate::poller::{CancelSignal, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

/// Deadlines and probe interval for lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// How long create waits for the load balancer to settle.
    pub create: Duration,
    /// How long delete waits for the load balancer to settle.
    pub delete: Duration,
    /// Delay between provisioning-state probes.
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Provider-wide context handed to every lifecycle callback.
#[derive(Clone)]
pub struct ProviderContext {
    load_balancers: Arc<dyn LoadBalancerApi>,
    timeouts: Timeouts,
    cancel: Option<CancelSignal>,
}

impl ProviderContext {
    /// Creates a context with default timeouts and no cancellation.
    #[must_use]
    pub fn new(load_balancers: Arc<dyn LoadBalancerApi>) -> Self {
        Self {
            load_balancers,
            timeouts: Timeouts::default(),
            cancel: None,
        }
    }

    /// Replaces the timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Lets waits started through this context be cancelled.
    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Returns the load balancer API.
    #[must_use]
    pub fn load_balancers(&self) -> &dyn LoadBalancerApi {
        self.load_balancers.as_ref()
    }

    /// Returns the timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Returns a copy of the cancel signal, if any.
    #[must_use]
    pub fn cancel_signal(&self) -> Option<CancelSignal> {
        self.cancel.clone()
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("timeouts", &self.timeouts)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}
