//! # Backend Liveness Monitor
//!
//! Independent periodic prober of the platform health endpoint. Maintains a
//! low-noise "backend reachable" signal the rest of the application reads
//! without re-probing: a boolean plus the completion time of the last probe.
//!
//! The monitor deliberately bypasses the request gateway: health is
//! infrastructure-level, must work while unauthenticated, and must never
//! trigger the 401 session-clearing flow or per-call error notices. It raises
//! exactly one success notice when the backend comes back (offline → online)
//! and exactly one warning log when it goes away (online → offline); a stable
//! state emits nothing.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, HealthCheckConfig};
use crate::error::{ApiError, ApiResult};
use crate::events::Notifier;
use crate::gateway::SUCCESS_CODE;

/// Snapshot of backend reachability
#[derive(Debug, Clone, PartialEq)]
pub struct HealthState {
    /// Whether the last probe found the backend reachable. Starts
    /// optimistically `true` so nothing flashes offline before the first
    /// probe completes.
    pub healthy: bool,
    /// Completion time of the most recent probe; absent until one finishes
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            healthy: true,
            last_checked_at: None,
        }
    }
}

/// Body shape of the dedicated health endpoint
///
/// The endpoint reports logical health either via an explicit status field or
/// the standard envelope success code; extra fields are ignored.
#[derive(Debug, Deserialize)]
struct HealthProbeBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl HealthProbeBody {
    fn indicates_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy") || self.code == Some(SUCCESS_CODE)
    }
}

#[derive(Debug)]
struct MonitorInner {
    client: Client,
    health_url: Url,
    config: HealthCheckConfig,
    state: RwLock<HealthState>,
    notifier: Notifier,
    running: AtomicBool,
    shutdown: Notify,
}

impl MonitorInner {
    /// One probe-and-update cycle
    ///
    /// The transition is read off the stored state inside the write lock, so
    /// overlapping cycles (the loop plus an explicit check, or two explicit
    /// checks) report each edge exactly once. A cycle still in flight when
    /// the monitor stops completes and applies its result (last-write-wins;
    /// a stopped monitor's output is no longer observed).
    async fn probe_cycle(&self) {
        let healthy = self.probe().await;
        let now = Utc::now();

        let was_healthy = {
            let mut state = self.state.write();
            let was_healthy = state.healthy;
            state.healthy = healthy;
            state.last_checked_at = Some(now);
            was_healthy
        };

        if healthy && !was_healthy {
            info!("Backend connection restored");
            self.notifier.success("backend connection restored");
        } else if !healthy && was_healthy {
            // Warn once per transition; repeating every interval would turn a
            // flaky backend into log and notification spam
            warn!("Backend unreachable, entering offline mode");
        }
    }

    /// Bounded reachability probe; always resolves to a boolean
    ///
    /// Any send failure, non-success status, undecodable body, or deadline
    /// expiry counts as unhealthy. Nothing propagates to the caller.
    async fn probe(&self) -> bool {
        let response = match self
            .client
            .get(self.health_url.clone())
            .timeout(self.config.probe_timeout())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Health probe failed to reach backend");
                return false;
            }
        };

        if !response.status().is_success() {
            debug!(
                status = response.status().as_u16(),
                "Health probe got non-success status"
            );
            return false;
        }

        match response.json::<HealthProbeBody>().await {
            Ok(body) => body.indicates_healthy(),
            Err(e) => {
                debug!(error = %e, "Health probe body failed to decode");
                false
            }
        }
    }
}

/// Periodic backend reachability monitor
///
/// `start()` runs an immediate probe and then one per interval on a background
/// task; `stop()` cancels the schedule. Both are idempotent. State accessors
/// are cheap reads safe to call from anywhere.
///
/// # Examples
///
/// ```rust,no_run
/// use bigdataops_client::{ClientConfig, HealthMonitor, Notifier};
///
/// # async fn example() -> bigdataops_client::ApiResult<()> {
/// let config = ClientConfig::default();
/// let monitor = HealthMonitor::new(&config, Notifier::new())?;
///
/// monitor.start();
/// // ... application runs, monitor probes every 30s ...
/// assert!(monitor.is_healthy() || !monitor.is_healthy());
/// monitor.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct HealthMonitor {
    inner: Arc<MonitorInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("health_url", &self.inner.health_url.as_str())
            .field("running", &self.is_running())
            .field("state", &self.state())
            .finish()
    }
}

impl HealthMonitor {
    /// Create a monitor for the configured health endpoint
    ///
    /// Builds its own bare HTTP client: no session token and no gateway
    /// notices ever attach to a probe.
    pub fn new(config: &ClientConfig, notifier: Notifier) -> ApiResult<Self> {
        let mut base_url = Url::parse(&config.api.base_url)
            .map_err(|e| ApiError::config(format!("Invalid base URL: {}", e)))?;

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let health_url = base_url
            .join(config.health.path.trim_start_matches('/'))
            .map_err(|e| ApiError::config(format!("Invalid health path: {}", e)))?;

        let client = Client::builder()
            .user_agent(format!("bigdataops-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(MonitorInner {
                client,
                health_url,
                config: config.health.clone(),
                state: RwLock::new(HealthState::default()),
                notifier,
                running: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            handle: Mutex::new(None),
        })
    }

    /// Start periodic probing; no-op when already running
    ///
    /// The first probe runs immediately, then one per configured interval.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Health monitor already running");
            return;
        }

        info!(
            url = %self.inner.health_url,
            interval_secs = self.inner.config.interval_secs,
            probe_timeout_ms = self.inner.config.probe_timeout_ms,
            "Starting health monitor"
        );

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            // The first tick completes immediately, giving the initial probe
            // at start rather than one interval later
            let mut interval = tokio::time::interval(inner.config.interval());

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        inner.probe_cycle().await;
                    }
                    _ = inner.shutdown.notified() => break,
                }
                if !inner.running.load(Ordering::SeqCst) {
                    break;
                }
            }

            debug!("Health monitor loop exited");
        });

        *self.handle.lock() = Some(handle);
    }

    /// Cancel the probe schedule; no-op when already stopped
    ///
    /// Only the pending schedule is cancelled: a probe already in flight
    /// completes and applies its result, then the loop exits at the running
    /// flag check. The wakeup reaches only a parked loop and stores nothing,
    /// so stopping mid-probe leaves no stale signal for a later restart. The
    /// task is awaited with a bounded grace period so stop cannot hang on a
    /// wedged probe.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            debug!("Health monitor already stopped");
            return;
        }

        self.inner.shutdown.notify_waiters();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let grace = self.inner.config.probe_timeout() + Duration::from_secs(1);
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("Health monitor task did not stop within grace period");
            }
        }

        info!("Stopped health monitor");
    }

    /// Run one probe-and-update cycle right now
    ///
    /// Usable whether or not the periodic schedule is running; the CLI's
    /// one-shot health command is built on this.
    pub async fn check_now(&self) {
        self.inner.probe_cycle().await;
    }

    /// Whether the last probe found the backend reachable
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.inner.state.read().healthy
    }

    /// Completion time of the most recent probe, if any finished yet
    #[must_use]
    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().last_checked_at
    }

    /// Whether the periodic schedule is active
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Full snapshot of the current reachability state
    #[must_use]
    pub fn state(&self) -> HealthState {
        self.inner.state.read().clone()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        // Nothing observes the monitor after drop; abort rather than leak
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}
