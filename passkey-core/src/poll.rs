//! Bounded polling for an external confirmation.
//!
//! Once a signed user operation is submitted, the caller waits for the
//! bundler to include it on-chain. The wait is an explicit loop: at most
//! `max_retries + 1` probes, `interval` apart, abortable at any point
//! through a [`CancellationToken`].
//!
//! ```no_run
//! use passkey_core::poll::{poll_bounded, Probe, TokioDelay};
//! use passkey_core::{PollPolicy, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Receipt;
//!
//! #[async_trait::async_trait]
//! impl Probe for Receipt {
//!     type Output = String;
//!     async fn probe(&self) -> Result<Option<String>> {
//!         Ok(Some("0xabc".to_string()))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let tx = poll_bounded(&PollPolicy::default(), &Receipt, &TokioDelay, &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::PollPolicy;
use crate::error::{PasskeyError, Result};

/// One attempt at observing the awaited event.
#[async_trait]
pub trait Probe: Send + Sync {
    type Output: Send;

    /// `Ok(None)` means "not yet"; an error stops polling.
    async fn probe(&self) -> Result<Option<Self::Output>>;
}

/// Injected wait between probes.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Wall-clock delay on the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[instrument(skip_all, fields(max_retries = policy.max_retries))]
pub async fn poll_bounded<P, D>(
    policy: &PollPolicy,
    probe: &P,
    delay: &D,
    cancel: &CancellationToken,
) -> Result<P::Output>
where
    P: Probe + ?Sized,
    D: Delay + ?Sized,
{
    let attempts = policy.max_retries.saturating_add(1);

    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return Err(PasskeyError::PollCancelled);
        }

        if let Some(output) = probe.probe().await? {
            info!(attempt, "Confirmation observed");
            return Ok(output);
        }

        if attempt == attempts {
            break;
        }

        debug!(attempt, remaining = attempts - attempt, "Not confirmed yet");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PasskeyError::PollCancelled),
            _ = delay.wait(policy.interval) => {}
        }
    }

    warn!(attempts, "Gave up waiting for confirmation");
    Err(PasskeyError::PollExhausted { attempts })
}
