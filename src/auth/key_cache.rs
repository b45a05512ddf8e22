//! Cached trust in the auth service's verification key
//!
//! # State Machine
//!
//! ```text
//! Uninitialized --fetch ok--> Ready <--fetch ok-- StaleButServing
//!       |                       |                       ^
//!   fetch fails             fetch fails                 |
//!       v                       +-----------------------+
//! Uninitialized
//! ```
//!
//! Readers take a snapshot (`Arc<VerificationKey>`) under a short read lock and
//! never wait on network I/O: the fetch and decode happen before the write lock
//! is taken, and the write lock only publishes the result. Refreshes are
//! serialized by a separate async mutex.
//!
//! Once a key has been published it is only ever replaced by another
//! successfully decoded key, never cleared.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::error::KeyTrustError;
use super::key_source::{KeySource, VerificationKey, decode_key_blob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    /// No key has ever been fetched
    Uninitialized,
    /// Serving the key from the most recent refresh
    Ready,
    /// The latest refresh failed; serving the last known good key
    StaleButServing,
}

impl TrustState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustState::Uninitialized => "uninitialized",
            TrustState::Ready => "ready",
            TrustState::StaleButServing => "stale_but_serving",
        }
    }
}

struct TrustSnapshot {
    key: Option<Arc<VerificationKey>>,
    state: TrustState,
    last_error: Option<KeyTrustError>,
    refreshed_at: Option<DateTime<Utc>>,
}

pub struct KeyTrustCache {
    source: Arc<dyn KeySource>,
    fetch_timeout: Duration,
    snapshot: RwLock<TrustSnapshot>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl KeyTrustCache {
    pub fn new(source: Arc<dyn KeySource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
            snapshot: RwLock::new(TrustSnapshot {
                key: None,
                state: TrustState::Uninitialized,
                last_error: None,
                refreshed_at: None,
            }),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TrustSnapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrustSnapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current key, if one has ever been fetched
    pub fn current(&self) -> Option<Arc<VerificationKey>> {
        self.read().key.clone()
    }

    pub fn state(&self) -> TrustState {
        self.read().state
    }

    pub fn last_error(&self) -> Option<KeyTrustError> {
        self.read().last_error.clone()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.read().refreshed_at
    }

    async fn fetch_and_decode(&self) -> Result<VerificationKey, KeyTrustError> {
        let blob = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
            .await
            .map_err(|_| KeyTrustError::Timeout(self.fetch_timeout))??;
        decode_key_blob(&blob)
    }

    /// Fetch, decode and publish a new key.
    ///
    /// On failure the previously published key (if any) stays in service.
    pub async fn refresh(&self) -> Result<(), KeyTrustError> {
        let _serialized = self.refresh_lock.lock().await;
        let outcome = self.fetch_and_decode().await;

        let mut snapshot = self.write();
        match outcome {
            Ok(key) => {
                let changed = snapshot.key.as_deref() != Some(&key);
                if changed {
                    info!(
                        source = %self.source.describe(),
                        fingerprint = %key.fingerprint(),
                        "Verification key published"
                    );
                } else {
                    debug!(fingerprint = %key.fingerprint(), "Verification key unchanged");
                }
                snapshot.key = Some(Arc::new(key));
                snapshot.state = TrustState::Ready;
                snapshot.last_error = None;
                snapshot.refreshed_at = Some(Utc::now());
                Ok(())
            }
            Err(err) => {
                if snapshot.key.is_some() {
                    snapshot.state = TrustState::StaleButServing;
                }
                snapshot.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Startup fetch: up to `attempts` tries with a fixed `delay` in between.
    pub async fn initialize(&self, attempts: u32, delay: Duration) -> Result<(), KeyTrustError> {
        let attempts = attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.refresh().await {
                Ok(()) => {
                    info!(attempt, "Key trust established");
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        source = %self.source.describe(),
                        error = %err,
                        "Failed to fetch verification key"
                    );
                    last_error = Some(err);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }

        Err(KeyTrustError::StartupExhausted {
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// Refresh in the background every `interval`. A zero interval disables it.
    pub fn spawn_refresh(self: Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            return None;
        }

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // first tick completes immediately

            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh().await {
                    warn!(
                        error = %err,
                        state = self.state().as_str(),
                        "Background key refresh failed"
                    );
                }
            }
        }))
    }
}
