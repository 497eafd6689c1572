//! Simulated long-running work.
//!
//! Each [`OperationKind`] sleeps for a fixed duration on the tokio runtime and
//! then resolves to a static [`MockPayload`]. At most one operation of a kind
//! runs at a time; a second `run` while one is in flight is ignored. There
//! is no cancellation.
//!
//! The runner knows nothing about the pipeline. Callers attach a completion
//! callback with [`OperationHandle::on_complete`] and decide what a
//! completion means.

pub mod mock;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::OperationsConfig;
use crate::pipeline::Stage;

pub use mock::MockPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Enhance,
    Analyze,
    Summarize,
    GenerateReport,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Enhance,
        OperationKind::Analyze,
        OperationKind::Summarize,
        OperationKind::GenerateReport,
    ];

    /// The pipeline stage whose work this operation simulates.
    pub fn stage(self) -> Stage {
        match self {
            OperationKind::Enhance => Stage::Enhance,
            OperationKind::Analyze => Stage::Analyze,
            OperationKind::Summarize => Stage::Summarize,
            OperationKind::GenerateReport => Stage::Report,
        }
    }

    pub fn for_stage(stage: Stage) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.stage() == stage)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Enhance => "enhance",
            OperationKind::Analyze => "analyze",
            OperationKind::Summarize => "summarize",
            OperationKind::GenerateReport => "generate-report",
        }
    }

    /// Translation key for the in-progress label
    pub fn progress_key(self) -> &'static str {
        match self {
            OperationKind::Enhance => "processing",
            OperationKind::Analyze => "analyzing",
            OperationKind::Summarize => "analyzingDamage",
            OperationKind::GenerateReport => "generating",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(Uuid);

impl OperationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Running,
    Completed(MockPayload),
    /// Only produced by failure injection
    Failed(String),
}

impl OperationStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, OperationStatus::Running)
    }
}

/// What a completion callback receives.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Always `Completed` or `Failed`
    pub status: OperationStatus,
}

/// A started operation.
#[derive(Debug)]
pub struct OperationHandle {
    id: OperationId,
    kind: OperationKind,
    started_at: DateTime<Utc>,
    status: watch::Receiver<OperationStatus>,
}

impl OperationHandle {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> OperationStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    /// Wait until the operation finishes and return its final status.
    pub async fn wait(mut self) -> OperationStatus {
        match self.status.wait_for(|s| !s.is_running()).await {
            Ok(status) => status.clone(),
            // The timer task is gone, which only happens when the runtime
            // shuts down underneath us.
            Err(_) => OperationStatus::Failed("operation abandoned".to_string()),
        }
    }

    /// Run `callback` once the operation finishes.
    ///
    /// Consuming the handle means a callback can be attached only once, so it
    /// fires exactly once per started operation.
    pub fn on_complete<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(OperationOutcome) + Send + 'static,
    {
        tokio::spawn(async move {
            let id = self.id;
            let kind = self.kind;
            let status = self.wait().await;
            callback(OperationOutcome { id, kind, status });
        })
    }
}

struct InFlight {
    started: Instant,
    duration: Duration,
}

/// Starts fixed-duration operations on the current tokio runtime.
#[derive(Clone)]
pub struct OperationRunner {
    config: Arc<OperationsConfig>,
    running: Arc<Mutex<HashMap<OperationKind, InFlight>>>,
}

impl OperationRunner {
    pub fn new(config: OperationsConfig) -> Self {
        Self {
            config: Arc::new(config),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A runner with the same settings and nothing in flight.
    ///
    /// Operations started on `self` keep running to completion but no longer
    /// count against the new runner's one-per-kind limit.
    pub fn detached(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn running(&self) -> MutexGuard<'_, HashMap<OperationKind, InFlight>> {
        lock_running(&self.running)
    }

    pub fn duration_for(&self, kind: OperationKind) -> Duration {
        self.config.duration_for(kind)
    }

    pub fn is_running(&self, kind: OperationKind) -> bool {
        self.running().contains_key(&kind)
    }

    pub fn any_running(&self) -> bool {
        !self.running().is_empty()
    }

    /// Fraction of the fixed duration elapsed, if `kind` is running.
    pub fn progress(&self, kind: OperationKind) -> Option<f64> {
        let running = self.running();
        let in_flight = running.get(&kind)?;
        if in_flight.duration.is_zero() {
            return Some(1.0);
        }
        let ratio = in_flight.started.elapsed().as_secs_f64() / in_flight.duration.as_secs_f64();
        Some(ratio.min(1.0))
    }

    /// Start `kind`, or return `None` if one is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self, kind: OperationKind) -> Option<OperationHandle> {
        let duration = self.config.duration_for(kind);
        {
            let mut running = self.running();
            if running.contains_key(&kind) {
                tracing::debug!(%kind, "Operation already running, ignoring trigger");
                return None;
            }
            running.insert(
                kind,
                InFlight {
                    started: Instant::now(),
                    duration,
                },
            );
        }

        let id = OperationId::new();
        let fail = self.config.fail.contains(&kind);
        let (tx, rx) = watch::channel(OperationStatus::Running);
        let running = Arc::clone(&self.running);

        tracing::info!(%kind, %id, duration_ms = duration.as_millis() as u64, "Operation started");

        tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            let status = if fail {
                OperationStatus::Failed(format!("{kind} failed (injected)"))
            } else {
                OperationStatus::Completed(mock::payload_for(kind))
            };

            // Free the slot before publishing so a completion callback can
            // start the same kind again.
            lock_running(&running).remove(&kind);

            match &status {
                OperationStatus::Failed(reason) => {
                    tracing::warn!(%kind, %id, reason = %reason, "Operation failed")
                }
                _ => tracing::info!(%kind, %id, "Operation completed"),
            }
            tx.send_replace(status);
        });

        Some(OperationHandle {
            id,
            kind,
            started_at: Utc::now(),
            status: rx,
        })
    }
}

fn lock_running(
    running: &Mutex<HashMap<OperationKind, InFlight>>,
) -> MutexGuard<'_, HashMap<OperationKind, InFlight>> {
    // The map holds plain data, so a panic elsewhere cannot leave it torn.
    running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn runner() -> OperationRunner {
        OperationRunner::new(OperationsConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_kind_twice_completes_once() {
        let runner = runner();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = runner.run(OperationKind::Enhance).expect("first run starts");
        assert!(runner.run(OperationKind::Enhance).is_none());

        let counter = Arc::clone(&calls);
        first
            .on_complete(move |outcome| {
                assert!(matches!(outcome.status, OperationStatus::Completed(_)));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!runner.is_running(OperationKind::Enhance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_transitions() {
        let runner = runner();
        let started = Instant::now();
        let handle = runner.run(OperationKind::Analyze).unwrap();

        assert!(handle.is_running());
        assert_eq!(handle.status(), OperationStatus::Running);
        assert!(runner.is_running(OperationKind::Analyze));

        let status = handle.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(4000));
        match status {
            OperationStatus::Completed(MockPayload::Analysis(analysis)) => {
                assert_eq!(analysis.areas.len(), 4)
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_kind_can_run_again_after_completion() {
        let runner = runner();
        runner.run(OperationKind::Summarize).unwrap().wait().await;
        assert!(runner.run(OperationKind::Summarize).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_kinds_run_independently() {
        let runner = runner();
        let analyze = runner.run(OperationKind::Analyze).unwrap();
        let enhance = runner.run(OperationKind::Enhance).unwrap();
        assert!(runner.any_running());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let tx2 = tx.clone();
        analyze.on_complete(move |o| tx.send(o.kind).unwrap());
        enhance.on_complete(move |o| tx2.send(o.kind).unwrap());

        assert_eq!(rx.recv().await, Some(OperationKind::Enhance));
        assert_eq!(rx.recv().await, Some(OperationKind::Analyze));
        assert!(!runner.any_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_failure() {
        let config = OperationsConfig {
            fail: vec![OperationKind::GenerateReport],
            ..OperationsConfig::default()
        };
        let runner = OperationRunner::new(config);

        let status = runner.run(OperationKind::GenerateReport).unwrap().wait().await;
        assert!(matches!(status, OperationStatus::Failed(_)));
        assert!(!runner.is_running(OperationKind::GenerateReport));

        let status = runner.run(OperationKind::Enhance).unwrap().wait().await;
        assert!(matches!(status, OperationStatus::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_runner_ignores_old_in_flight() {
        let old = runner();
        let handle = old.run(OperationKind::Enhance).unwrap();

        let fresh = old.detached();
        assert!(!fresh.any_running());
        tokio::time::advance(Duration::from_secs(1)).await;
        let restarted = fresh.run(OperationKind::Enhance).expect("kind is free again");
        assert!(old.is_running(OperationKind::Enhance));

        handle.wait().await;
        assert!(!old.any_running());
        assert!(fresh.is_running(OperationKind::Enhance));
        assert!(matches!(restarted.wait().await, OperationStatus::Completed(_)));
        assert!(!fresh.any_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress() {
        let runner = runner();
        assert_eq!(runner.progress(OperationKind::Enhance), None);

        let handle = runner.run(OperationKind::Enhance).unwrap();
        tokio::time::advance(Duration::from_millis(1500)).await;
        let progress = runner.progress(OperationKind::Enhance).unwrap();
        assert!((0.45..=0.55).contains(&progress), "progress {progress}");

        handle.wait().await;
        assert_eq!(runner.progress(OperationKind::Enhance), None);
    }

    #[test]
    fn test_kind_stage_mapping() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::for_stage(kind.stage()), Some(kind));
        }
        assert_eq!(OperationKind::for_stage(Stage::Upload), None);
    }
}
