//! Waiting for asynchronous remote operations to settle.
//!
//! Every mutating ARM call returns before the change is live. A
//! [`StateWaiter`] repeatedly probes a provisioning state until it reaches a
//! target state, leaves the pending set, the deadline passes, or the caller
//! cancels the wait. The loop runs on the calling task and sleeps between
//! probes.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{PollError, ProviderError, Result};

/// Default deadline for a wait (ten minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default fixed delay between probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Creates a linked cancel handle and signal.
#[must_use]
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver })
}

/// Fires a [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Requests cancellation of every wait observing the linked signal.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Observed by a [`StateWaiter`] to stop early.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves when cancellation is requested.
    ///
    /// Never resolves if the handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// A single wait for a provisioning state.
#[derive(Debug, Clone)]
pub struct StateWaiter {
    /// Description of what is being waited on, used in errors.
    resource: String,
    /// States that mean "still working".
    pending: Vec<String>,
    /// States that mean "done".
    target: Vec<String>,
    /// Deadline measured from the first probe.
    timeout: Duration,
    /// Delay between probes.
    interval: Duration,
    /// Optional early-exit signal.
    cancel: Option<CancelSignal>,
}

impl StateWaiter {
    /// Creates a waiter for the described resource with default timing.
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            pending: Vec::new(),
            target: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }

    /// Sets the pending states.
    #[must_use]
    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = states.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the target states.
    #[must_use]
    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = states.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between probes.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stops the wait early when `signal` fires.
    #[must_use]
    pub fn cancel_on(mut self, signal: Option<CancelSignal>) -> Self {
        self.cancel = signal;
        self
    }

    /// Probes until a target state is observed and returns the value that
    /// accompanied it.
    ///
    /// # Errors
    ///
    /// Returns the probe's own error unchanged, [`PollError::UnexpectedState`]
    /// for a state outside both sets, [`PollError::Timeout`] once the
    /// deadline has passed while pending, or [`PollError::Cancelled`].
    pub async fn wait_for_state<T, F, Fut>(&self, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String)>>,
    {
        let start = Instant::now();
        let mut cancel = self.cancel.clone();
        let mut attempt: u32 = 0;

        loop {
            if cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
                return Err(self.cancelled());
            }

            attempt = attempt.saturating_add(1);
            let (value, state) = probe().await?;
            debug!("{}: probe {attempt} observed state '{state}'", self.resource);

            if self.target.contains(&state) {
                info!(
                    "{} reached state '{state}' after {:?}",
                    self.resource,
                    start.elapsed()
                );
                return Ok(value);
            }

            if !self.pending.contains(&state) {
                warn!("{} entered unexpected state '{state}'", self.resource);
                return Err(ProviderError::Poll(PollError::UnexpectedState {
                    resource: self.resource.clone(),
                    state,
                    expected: self.target.clone(),
                }));
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(ProviderError::Poll(PollError::Timeout {
                    resource: self.resource.clone(),
                    elapsed,
                    last_state: state,
                }));
            }

            let delay = self.interval.min(self.timeout.saturating_sub(elapsed));
            match cancel.as_mut() {
                Some(signal) => {
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = signal.cancelled() => return Err(self.cancelled()),
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    fn cancelled(&self) -> ProviderError {
        info!("Wait for {} cancelled", self.resource);
        ProviderError::Poll(PollError::Cancelled {
            resource: self.resource.clone(),
        })
    }
}
