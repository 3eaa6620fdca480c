//! Bounded polling for the device code token.
//!
//! The operator completes the login in a browser while we keep asking the provider for a token
//! every `interval`. A separate deadline bounds the wait. The loop runs in its own task and hands
//! its single outcome back over a oneshot channel.

use crate::provider::{ClientRegistration, DeviceAuthorization, IdentityProvider, TokenExchange};

/// Added to the polling period whenever the provider answers `slow_down` (RFC 8628 section 3.5).
pub const SLOW_DOWN_INCREMENT: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Waiting,
    Authorized,
    Expired,
    Denied,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Waiting)
    }
}

/// Polls until the provider issues a token, rejects the grant, or `timeout` elapses.
///
/// `interval` must be positive and `timeout` must not be shorter than `interval`; otherwise
/// [`crate::Error::Config`] is returned without contacting the provider. When a tick and the
/// deadline land on the same instant, the deadline wins.
pub async fn poll<P>(
    provider: std::sync::Arc<P>,
    client: ClientRegistration,
    device: DeviceAuthorization,
    interval: std::time::Duration,
    timeout: std::time::Duration,
) -> crate::Result<crate::token::TokenGrant>
where
    P: IdentityProvider + ?Sized + 'static,
{
    poll_with_cancel(
        provider,
        client,
        device,
        interval,
        timeout,
        std::future::pending::<()>(),
    )
    .await
}

/// Same as [`poll`], additionally stopping with [`crate::Error::Cancelled`] once `cancel`
/// resolves.
pub async fn poll_with_cancel<P, C>(
    provider: std::sync::Arc<P>,
    client: ClientRegistration,
    device: DeviceAuthorization,
    interval: std::time::Duration,
    timeout: std::time::Duration,
    cancel: C,
) -> crate::Result<crate::token::TokenGrant>
where
    P: IdentityProvider + ?Sized + 'static,
    C: std::future::Future<Output = ()> + Send + 'static,
{
    crate::config::validate_poll_bounds(interval, timeout)?;

    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let mut poller = Poller {
            provider: &*provider,
            client: &client,
            device: &device,
            interval,
            timeout,
            state: PollState::Waiting,
            attempts: 0,
        };
        let result = poller.run(cancel).await;
        if tx.send(result).is_err() {
            tracing::debug!("token poller result dropped; caller went away");
        }
    });

    rx.await.map_err(|_| {
        crate::Error::Provider("token poller stopped without reporting a result".to_owned())
    })?
}

struct Poller<'a, P: ?Sized> {
    provider: &'a P,
    client: &'a ClientRegistration,
    device: &'a DeviceAuthorization,
    interval: std::time::Duration,
    timeout: std::time::Duration,
    state: PollState,
    attempts: u32,
}

impl<'a, P> Poller<'a, P>
where
    P: IdentityProvider + ?Sized,
{
    async fn run<C>(&mut self, cancel: C) -> crate::Result<crate::token::TokenGrant>
    where
        C: std::future::Future<Output = ()>,
    {
        let (provider, client, device) = (self.provider, self.client, self.device);
        let started = tokio::time::Instant::now();
        let deadline = tokio::time::sleep_until(started + self.timeout);
        tokio::pin!(deadline);
        tokio::pin!(cancel);

        let mut ticker = new_ticker(started, self.interval);

        tracing::debug!(interval = ?self.interval, timeout = ?self.timeout, "Waiting for authorization");
        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => return Err(self.expire()),
                _ = &mut cancel => return Err(crate::Error::Cancelled),
                _ = ticker.tick() => {}
            }

            self.attempts += 1;
            tracing::debug!(attempt = self.attempts, elapsed = ?started.elapsed(), "Checking AWS SSO Device Grant flow");

            // an in-flight exchange still loses to the deadline
            let exchange = tokio::select! {
                biased;
                _ = &mut deadline => return Err(self.expire()),
                _ = &mut cancel => return Err(crate::Error::Cancelled),
                r = provider.create_token(client, device) => r,
            };

            match exchange {
                Ok(TokenExchange::Pending) => {}
                Ok(TokenExchange::SlowDown) => {
                    self.interval += SLOW_DOWN_INCREMENT;
                    ticker = new_ticker(tokio::time::Instant::now(), self.interval);
                    tracing::debug!(interval = ?self.interval, "Received slow_down request");
                }
                Ok(TokenExchange::Issued(token)) => {
                    self.transition(PollState::Authorized);
                    return Ok(token);
                }
                Err(e @ crate::Error::PollDenied(_)) => {
                    self.transition(PollState::Denied);
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(attempt = self.attempts, err = ?e, "token exchange failed");
                    return Err(e);
                }
            }
        }
    }

    fn expire(&mut self) -> crate::Error {
        self.transition(PollState::Expired);
        crate::Error::PollTimeout(self.timeout)
    }

    fn transition(&mut self, next: PollState) {
        debug_assert!(!self.state.is_terminal(), "left terminal state {:?}", self.state);
        tracing::debug!(from = ?self.state, to = ?next, attempts = self.attempts, "poll state");
        self.state = next;
    }
}

/// Recurring tick whose first firing is one full period after `start`.
fn new_ticker(start: tokio::time::Instant, period: std::time::Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval_at(start + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker
}
