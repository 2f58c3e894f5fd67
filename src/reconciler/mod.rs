//! Expiry reconciler
//!
//! A single background task that soft-deletes expired links on a fixed
//! interval. The first pass runs as soon as the task starts.
//!
//! ```text
//! Idle --start--> Running --pass done--> Idle --tick--> Running ...
//!   any state --stop--> Stopped
//! ```
//!
//! `stop()` only cancels the token: a pass already in flight finishes (its
//! sweep is one transaction), and no new pass starts afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::storage::{SeaOrmStorage, SweepReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    Running,
    Stopped,
}

impl ReconcilerState {
    fn as_u8(self) -> u8 {
        match self {
            ReconcilerState::Idle => 0,
            ReconcilerState::Running => 1,
            ReconcilerState::Stopped => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => ReconcilerState::Idle,
            1 => ReconcilerState::Running,
            _ => ReconcilerState::Stopped,
        }
    }
}

pub struct ExpiryReconciler {
    storage: Arc<SeaOrmStorage>,
    interval: Duration,
    state: AtomicU8,
    cancel: CancellationToken,
    /// 串行化清扫：后台任务与 run_once 的手动调用不会重叠
    pass_lock: tokio::sync::Mutex<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
    completed_passes: AtomicU64,
}

impl ExpiryReconciler {
    pub fn new(storage: Arc<SeaOrmStorage>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            storage,
            interval: interval.max(Duration::from_millis(10)),
            state: AtomicU8::new(ReconcilerState::Idle.as_u8()),
            cancel: CancellationToken::new(),
            pass_lock: tokio::sync::Mutex::new(()),
            handle: Mutex::new(None),
            completed_passes: AtomicU64::new(0),
        })
    }

    pub fn state(&self) -> ReconcilerState {
        ReconcilerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Passes that ran to completion, successful or not.
    pub fn completed_passes(&self) -> u64 {
        self.completed_passes.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Spawn the background loop. Returns `false` if it was already started
    /// or the reconciler has been stopped.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut handle = self.handle.lock();
        if handle.is_some() || self.cancel.is_cancelled() {
            return false;
        }

        let this = Arc::clone(self);
        *handle = Some(tokio::spawn(async move { this.run_loop().await }));

        info!(
            "Expiry reconciler started (interval: {}s)",
            self.interval.as_secs()
        );
        true
    }

    /// Signal the loop to exit. Idempotent and does not wait.
    pub fn stop(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.state
            .store(ReconcilerState::Stopped.as_u8(), Ordering::SeqCst);
        info!("Expiry reconciler stop requested");
    }

    /// Stop and wait for the background task to exit, including any pass
    /// that was in flight.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            error!("Expiry reconciler task ended abnormally: {}", e);
        }
    }

    /// Run one sweep now, serialized with the background loop.
    pub async fn run_once(&self) -> Result<SweepReport> {
        let _guard = self.pass_lock.lock().await;

        let _ = self.state.compare_exchange(
            ReconcilerState::Idle.as_u8(),
            ReconcilerState::Running.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        let result = self.storage.sweep_expired(Utc::now()).await;

        // a stop during the pass keeps the state at Stopped
        let _ = self.state.compare_exchange(
            ReconcilerState::Running.as_u8(),
            ReconcilerState::Idle.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.completed_passes.fetch_add(1, Ordering::SeqCst);

        match &result {
            Ok(report) if report.total() > 0 => info!(
                "Expired link sweep: {} by time, {} by click limit",
                report.time_expired, report.click_expired
            ),
            Ok(_) => debug!("Expired link sweep: nothing to retire"),
            Err(e) => error!("Expired link sweep failed: {}", e),
        }
        result
    }

    async fn run_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // 第一次 tick 立即完成，即启动时的首轮清扫
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if self.cancel.is_cancelled() {
                break;
            }

            // errors are logged inside; the next tick retries
            let _ = self.run_once().await;
        }

        self.state
            .store(ReconcilerState::Stopped.as_u8(), Ordering::SeqCst);
        debug!("Expiry reconciler loop exited");
    }
}
