//! Background token refresh.
//!
//! One [`RefreshLoop`] runs per signed-in session. Every tick it reads the
//! current [`TokenPair`] from the session cache, exchanges the refresh token
//! through a [`TokenRefresher`], and writes the new pair back.
//!
//! # Failure handling
//!
//! - Transport errors, 5xx and other non-auth failures are transient: the
//!   loop logs them and tries again on the next tick with whatever pair is
//!   cached then.
//! - An authentication rejection (401/403) becomes terminal once
//!   `max_auth_rejections` rejections have happened in a row, or when the
//!   last successful refresh is older than `refresh_token_ttl`. The loop then
//!   removes the token pair from the cache, reports
//!   [`SessionStatus::Expired`] and exits.
//!
//! # Cancellation
//!
//! [`RefreshLoopHandle::stop`] signals the task and joins it. Once `stop`
//! returns the task has exited, so it cannot write to the cache again. An
//! in-flight refresh request is abandoned rather than awaited.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::cache::{SessionCache, keys};
use crate::token::TokenRefresher;

/// Default number of consecutive auth rejections before giving up.
pub const DEFAULT_MAX_AUTH_REJECTIONS: u32 = 3;

/// Timing and give-up rules for a refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Time between refreshes; the access token lifetime.
    pub interval: Duration,

    /// Lifetime of a refresh token. A rejection after this long without a
    /// successful refresh is terminal.
    pub refresh_token_ttl: Duration,

    /// Consecutive rejections after which the session is considered lost.
    pub max_auth_rejections: u32,
}

impl RefreshPolicy {
    pub fn new(interval: Duration, refresh_token_ttl: Duration) -> Self {
        Self {
            interval,
            refresh_token_ttl,
            max_auth_rejections: DEFAULT_MAX_AUTH_REJECTIONS,
        }
    }

    pub fn with_max_auth_rejections(mut self, max: u32) -> Self {
        self.max_auth_rejections = max.max(1);
        self
    }
}

/// Lifecycle state reported by a refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Refreshing on schedule.
    Active,
    /// Refresh failed terminally; the user must sign in again.
    Expired,
    /// Cancelled through the handle.
    Stopped,
}

/// Handle to a running refresh loop.
pub struct RefreshLoopHandle {
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
    status: watch::Receiver<SessionStatus>,
    interval: Duration,
}

impl RefreshLoopHandle {
    /// Stop the loop and wait for the task to exit.
    ///
    /// Safe to call more than once, and after the loop ended on its own.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            // The receiver is gone if the loop already exited.
            let _ = tx.send(()).await;
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("refresh task ended abnormally: {}", e);
            }
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Whether the loop gave up on the session.
    pub fn is_expired(&self) -> bool {
        self.status() == SessionStatus::Expired
    }

    /// Refresh interval this loop was started with.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for RefreshLoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshLoopHandle")
            .field("status", &self.status())
            .field("interval", &self.interval)
            .finish()
    }
}

/// The periodic refresh task.
pub struct RefreshLoop {
    cache: Arc<SessionCache>,
    refresher: Arc<dyn TokenRefresher>,
    policy: RefreshPolicy,
    shutdown: mpsc::Receiver<()>,
    status: watch::Sender<SessionStatus>,
}

impl RefreshLoop {
    /// Spawn a refresh loop on the current Tokio runtime.
    ///
    /// The first refresh fires one interval after this call.
    pub fn start(
        cache: Arc<SessionCache>,
        refresher: Arc<dyn TokenRefresher>,
        policy: RefreshPolicy,
    ) -> RefreshLoopHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (status_tx, status_rx) = watch::channel(SessionStatus::Active);

        let task = RefreshLoop {
            cache,
            refresher,
            policy,
            shutdown: shutdown_rx,
            status: status_tx,
        };
        let join_handle = tokio::spawn(task.run());

        info!(interval = ?policy.interval, "token refresh loop started");

        RefreshLoopHandle {
            shutdown: Mutex::new(Some(shutdown_tx)),
            join_handle: Mutex::new(Some(join_handle)),
            status: status_rx,
            interval: policy.interval,
        }
    }

    async fn run(mut self) {
        let period = self.policy.interval;
        if period.is_zero() {
            error!("token refresh interval is zero, session cannot be kept alive");
            self.cache.remove(keys::TOKENS.name());
            self.status.send_replace(SessionStatus::Expired);
            return;
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut rejections: u32 = 0;
        let mut last_success = Instant::now();

        loop {
            // A closed channel (handle dropped) also ends the loop.
            tokio::select! {
                biased;
                _ = self.shutdown.recv() => break,
                _ = ticker.tick() => {}
            }

            let current = match self.cache.load(&keys::TOKENS) {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!("skipping token refresh: {}", e);
                    continue;
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.recv() => break,
                outcome = self.refresher.refresh(&current) => outcome,
            };

            match outcome {
                Ok(tokens) => {
                    self.cache.store(&keys::TOKENS, tokens);
                    rejections = 0;
                    last_success = Instant::now();
                    debug!("token pair refreshed");
                }
                Err(e) if e.is_auth_rejection() => {
                    rejections += 1;
                    let lapsed = last_success.elapsed() >= self.policy.refresh_token_ttl;
                    if rejections >= self.policy.max_auth_rejections || lapsed {
                        error!(
                            rejections,
                            lapsed, "giving up on token refresh, session expired: {}", e
                        );
                        self.cache.remove(keys::TOKENS.name());
                        self.status.send_replace(SessionStatus::Expired);
                        return;
                    }
                    warn!(rejections, "token refresh rejected, retrying next tick: {}", e);
                }
                Err(e) => {
                    warn!("error refreshing tokens, retrying next tick: {}", e);
                }
            }
        }

        self.status.send_replace(SessionStatus::Stopped);
        debug!("token refresh loop stopped");
    }
}
