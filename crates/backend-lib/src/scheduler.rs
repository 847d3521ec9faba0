// ============================
// crates/backend-lib/src/scheduler.rs
// ============================
//! Periodic expiry scans.
//!
//! Every configured threshold gets its own task and timer. On each tick the
//! task walks all users, collects the items expiring inside its lookahead
//! window and sends one summary per user. Thresholds never coordinate, so a
//! user may hear about the same item from several of them.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use larder_common::{Notification, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::metrics::{DISPATCH_FAILED, NOTIFICATION_SENT, SCAN_QUERY_FAILED, SCAN_TICK};
use crate::notify::{expiry_notification, Notifier, NotifyError};
use crate::storage::{InventoryStore, StorageError, UserDirectory};

const DAY_SECS: u64 = 24 * 60 * 60;
const HOUR_SECS: u64 = 60 * 60;

/// Longest lookahead a threshold may use
pub const MAX_LOOKAHEAD_SECS: u64 = 365 * DAY_SECS;

/// Scan failures. `Enumerate` and `WindowOutOfRange` end a tick; the others
/// are logged per user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("failed to enumerate users: {0}")]
    Enumerate(StorageError),

    #[error("failed to load user {user_id}: {source}")]
    LookupFailed { user_id: UserId, source: StorageError },

    #[error("expiring-items query failed for user {user_id}: {source}")]
    QueryFailed { user_id: UserId, source: StorageError },

    #[error("dispatch to user {user_id} failed: {source}")]
    DispatchFailed { user_id: UserId, source: NotifyError },

    #[error("scan window ending {lookahead_secs}s after {now} is out of range")]
    WindowOutOfRange { now: DateTime<Utc>, lookahead_secs: i64 },
}

/// One lookahead window and how often it is scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanThreshold {
    pub lookahead_secs: u64,
    pub interval_secs: u64,
}

impl ScanThreshold {
    pub const fn new(lookahead_secs: u64, interval_secs: u64) -> Self {
        Self {
            lookahead_secs,
            interval_secs,
        }
    }

    /// The lookahead window, or `None` when it is zero or above
    /// [`MAX_LOOKAHEAD_SECS`]
    pub fn lookahead(&self) -> Option<chrono::Duration> {
        if self.lookahead_secs == 0 || self.lookahead_secs > MAX_LOOKAHEAD_SECS {
            return None;
        }
        i64::try_from(self.lookahead_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
    }

    /// Whether a scheduler can run this threshold
    pub fn is_usable(&self) -> bool {
        self.interval_secs > 0 && self.lookahead().is_some()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Default thresholds: 1 day every 4 h, 3 days every 12 h, 7 days daily
pub fn default_thresholds() -> Vec<ScanThreshold> {
    vec![
        ScanThreshold::new(DAY_SECS, 4 * HOUR_SECS),
        ScanThreshold::new(3 * DAY_SECS, 12 * HOUR_SECS),
        ScanThreshold::new(7 * DAY_SECS, DAY_SECS),
    ]
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub enabled: bool,
    pub thresholds: Vec<ScanThreshold>,
    /// Upper bound on a single dispatch, `0` disables the limit
    pub dispatch_timeout_secs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: default_thresholds(),
            dispatch_timeout_secs: 30,
        }
    }
}

/// Outcome of one tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    pub notified: usize,
    pub skipped_no_target: usize,
    pub lookup_failures: usize,
    pub query_failures: usize,
    pub dispatch_failures: usize,
}

/// Runs expiry scans against the storage collaborators
pub struct ScanScheduler {
    directory: Arc<dyn UserDirectory>,
    inventory: Arc<dyn InventoryStore>,
    notifier: Arc<dyn Notifier>,
    thresholds: Vec<ScanThreshold>,
    dispatch_timeout: Option<Duration>,
}

/// Stops the scan tasks started by [`ScanScheduler::start`]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal every task and wait for it to exit. A scan already running
    /// finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "scan task ended abnormally");
            }
        }
        info!("scan scheduler stopped");
    }

    /// Number of running threshold tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl ScanScheduler {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        inventory: Arc<dyn InventoryStore>,
        notifier: Arc<dyn Notifier>,
        settings: &ScanSettings,
    ) -> Self {
        let dispatch_timeout = (settings.dispatch_timeout_secs > 0)
            .then(|| Duration::from_secs(settings.dispatch_timeout_secs));
        Self {
            directory,
            inventory,
            notifier,
            thresholds: settings.thresholds.clone(),
            dispatch_timeout,
        }
    }

    /// Spawn one task per threshold. The first scan of each runs one
    /// interval after start.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);

        let tasks = self
            .thresholds
            .iter()
            .copied()
            .filter_map(|threshold| {
                let lookahead = threshold.lookahead().filter(|_| threshold.interval_secs > 0);
                if lookahead.is_none() {
                    warn!(
                        lookahead_secs = threshold.lookahead_secs,
                        interval_secs = threshold.interval_secs,
                        "ignoring unusable threshold"
                    );
                }
                lookahead.map(|lookahead| (threshold, lookahead))
            })
            .map(|(threshold, lookahead)| {
                let scheduler = Arc::clone(&self);
                let shutdown = shutdown_rx.clone();
                tokio::spawn(async move {
                    scheduler.run_threshold(threshold, lookahead, shutdown).await
                })
            })
            .collect::<Vec<_>>();

        info!(tasks = tasks.len(), "scan scheduler started");
        SchedulerHandle { shutdown, tasks }
    }

    async fn run_threshold(
        &self,
        threshold: ScanThreshold,
        lookahead: chrono::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let period = threshold.interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // Err means the handle was dropped, which also ends the task
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    match self.run_scan(lookahead, Utc::now()).await {
                        Ok(report) => debug!(
                            lookahead_secs = threshold.lookahead_secs,
                            scanned = report.scanned,
                            notified = report.notified,
                            dispatch_failures = report.dispatch_failures,
                            "scan complete"
                        ),
                        Err(e) => warn!(
                            lookahead_secs = threshold.lookahead_secs,
                            error = %e,
                            "scan aborted"
                        ),
                    }
                }
            }
        }
    }

    /// Run a single scan over `[now, now + lookahead]`
    pub async fn run_scan(
        &self,
        lookahead: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<ScanReport, ScanError> {
        let days = (u64::try_from(lookahead.num_seconds()).unwrap_or(0) / DAY_SECS).to_string();
        metrics::counter!(SCAN_TICK, "lookahead_days" => days.clone()).increment(1);

        let end = now
            .checked_add_signed(lookahead)
            .ok_or(ScanError::WindowOutOfRange {
                now,
                lookahead_secs: lookahead.num_seconds(),
            })?;

        let user_ids = self
            .directory
            .list_user_ids()
            .await
            .map_err(ScanError::Enumerate)?;

        let mut report = ScanReport::default();
        let mut outgoing: Vec<(UserId, String, Notification)> = Vec::new();

        for user_id in user_ids {
            report.scanned += 1;

            let user = match self.directory.lookup_user(user_id).await {
                Ok(user) => user,
                Err(source) => {
                    let err = ScanError::LookupFailed { user_id, source };
                    warn!(error = %err, "skipping user");
                    report.lookup_failures += 1;
                    continue;
                },
            };

            let Some(target) = user.delivery_target else {
                report.skipped_no_target += 1;
                continue;
            };

            let items = match self.inventory.expiring_items(user_id, now, end).await {
                Ok(items) => items,
                Err(source) => {
                    let err = ScanError::QueryFailed { user_id, source };
                    warn!(error = %err, "skipping user");
                    metrics::counter!(SCAN_QUERY_FAILED, "lookahead_days" => days.clone())
                        .increment(1);
                    report.query_failures += 1;
                    continue;
                },
            };

            if let Some(notification) = expiry_notification(&items, now) {
                outgoing.push((user_id, target, notification));
            }
        }

        let results = join_all(outgoing.iter().map(|(user_id, target, notification)| async move {
            (*user_id, self.dispatch(target, notification).await)
        }))
        .await;

        for (user_id, result) in results {
            match result {
                Ok(()) => {
                    metrics::counter!(NOTIFICATION_SENT, "lookahead_days" => days.clone())
                        .increment(1);
                    report.notified += 1;
                },
                Err(source) => {
                    let err = ScanError::DispatchFailed { user_id, source };
                    warn!(error = %err, "notification not delivered");
                    metrics::counter!(DISPATCH_FAILED, "lookahead_days" => days.clone())
                        .increment(1);
                    report.dispatch_failures += 1;
                },
            }
        }

        Ok(report)
    }

    async fn dispatch(&self, target: &str, notification: &Notification) -> Result<(), NotifyError> {
        match self.dispatch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.notifier.dispatch(target, notification))
                .await
                .map_err(|_| NotifyError::Timeout)?,
            None => self.notifier.dispatch(target, notification).await,
        }
    }
}
