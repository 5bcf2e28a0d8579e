//! Best-effort propagation of local changes to the remote service.
//!
//! Callers persist locally first and then hand the change to
//! [`SyncCoordinator::push`], which returns immediately. The remote call runs
//! on the captured runtime, bounded by a per-call timeout. Its outcome is
//! logged and never reported back into local state.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::client::DEFAULT_TIMEOUT;
use super::error::SyncError;
use super::remote::RemoteApi;
use crate::models::Diary;

/// Name sent as `rsn` until a player is known.
pub const UNKNOWN_ACTOR: &str = "Unknown";

/// A local change to mirror remotely.
#[derive(Debug, Clone)]
pub enum PushOp {
    Create(Diary),
    Update(Diary),
    Delete(Uuid),
    Motd(String),
}

impl PushOp {
    fn label(&self) -> &'static str {
        match self {
            PushOp::Create(_) => "create diary",
            PushOp::Update(_) => "update diary",
            PushOp::Delete(_) => "delete diary",
            PushOp::Motd(_) => "update motd",
        }
    }

    async fn apply(&self, remote: &dyn RemoteApi, rsn: &str) -> Result<(), SyncError> {
        match self {
            PushOp::Create(diary) => {
                let stored = remote.create_diary(diary, rsn).await?;
                if stored.id != diary.id {
                    // The service assigns its own id; the local record keeps ours.
                    tracing::debug!(local = %diary.id, remote = %stored.id, "Remote assigned a different diary id");
                }
                Ok(())
            }
            PushOp::Update(diary) => remote.update_diary(diary, rsn).await.map(|_| ()),
            PushOp::Delete(id) => remote.delete_diary(*id, rsn).await,
            PushOp::Motd(motd) => remote.update_motd(motd, rsn).await,
        }
    }
}

/// What a pull fetched. Each part succeeds or fails on its own.
#[derive(Debug)]
pub struct RemoteSnapshot {
    pub diaries: Result<Vec<Diary>, SyncError>,
    pub motd: Result<String, SyncError>,
}

pub struct SyncCoordinator {
    remote: Option<Arc<dyn RemoteApi>>,
    runtime: Option<Handle>,
    actor: RwLock<String>,
    timeout: Duration,
    closed: AtomicBool,
    succeeded: Arc<AtomicUsize>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncCoordinator {
    /// A coordinator with no remote: every push is a no-op.
    pub fn disabled() -> Self {
        Self {
            remote: None,
            runtime: None,
            actor: RwLock::new(UNKNOWN_ACTOR.to_string()),
            timeout: DEFAULT_TIMEOUT,
            closed: AtomicBool::new(false),
            succeeded: Arc::new(AtomicUsize::new(0)),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Remote calls are spawned on `runtime`, each bounded by `timeout`.
    pub fn new(remote: Arc<dyn RemoteApi>, runtime: Handle, timeout: Duration) -> Self {
        Self {
            remote: Some(remote),
            runtime: Some(runtime),
            timeout,
            ..Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some() && self.runtime.is_some()
    }

    /// Sets the player name sent with remote requests.
    pub fn set_actor(&self, rsn: impl Into<String>) {
        *self.actor.write().unwrap_or_else(PoisonError::into_inner) = rsn.into();
    }

    pub fn actor(&self) -> String {
        self.actor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops scheduling new remote calls. Calls already running continue.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Schedules `op` remotely. Returns false when nothing was scheduled.
    pub fn push(&self, op: PushOp) -> bool {
        let Some(remote) = self.remote.clone() else {
            tracing::debug!(op = op.label(), "Remote sync not configured, skipping push");
            return false;
        };
        let rsn = self.actor();
        let timeout = self.timeout;
        let succeeded = Arc::clone(&self.succeeded);

        self.spawn(async move {
            let label = op.label();
            match tokio::time::timeout(timeout, op.apply(remote.as_ref(), &rsn)).await {
                Ok(Ok(())) => {
                    tracing::info!(op = label, "Remote push succeeded");
                    succeeded.fetch_add(1, Ordering::SeqCst);
                }
                Ok(Err(e)) => {
                    tracing::warn!(op = label, error = %e, "Remote push failed, local copy kept");
                }
                Err(_) => {
                    tracing::warn!(op = label, ?timeout, "Remote push timed out, local copy kept");
                }
            }
        })
    }

    /// Runs `task` on the captured runtime and tracks it until [`flush`](Self::flush).
    pub(crate) fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(runtime) = &self.runtime else {
            return false;
        };
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!("Sync coordinator shut down, not scheduling");
            return false;
        }

        let handle = runtime.spawn(task);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
        true
    }

    /// Waits for every scheduled call and returns how many pushes succeeded
    /// since the last flush.
    pub async fn flush(&self) -> usize {
        loop {
            let pending =
                std::mem::take(&mut *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner));
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Sync task panicked");
                }
            }
        }
        self.succeeded.swap(0, Ordering::SeqCst)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SyncError>>,
    ) -> Result<T, SyncError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| SyncError::Timeout(self.timeout))?
    }

    /// Fetches the remote diary collection and MOTD concurrently.
    pub async fn pull(&self) -> Result<RemoteSnapshot, SyncError> {
        let remote = self.remote.as_ref().ok_or(SyncError::NotConfigured)?;
        let (diaries, motd) = tokio::join!(
            self.bounded(remote.fetch_diaries()),
            self.bounded(remote.fetch_motd())
        );
        Ok(RemoteSnapshot { diaries, motd })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use futures::future::BoxFuture;

    /// In-memory stand-in for the remote service that records every call.
    #[derive(Default)]
    pub struct FakeRemote {
        pub diaries: Mutex<Vec<Diary>>,
        pub motd: Mutex<String>,
        pub calls: Mutex<Vec<String>>,
        pub fail: AtomicBool,
        pub delay: Mutex<Option<Duration>>,
    }

    impl FakeRemote {
        pub fn with_diaries(diaries: Vec<Diary>) -> Self {
            let fake = Self::default();
            *fake.diaries.lock().unwrap() = diaries;
            fake
        }

        pub fn failing() -> Self {
            let fake = Self::default();
            fake.fail.store(true, Ordering::SeqCst);
            fake
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record<T: Send + 'static>(
            &self,
            call: String,
            value: T,
        ) -> BoxFuture<'_, Result<T, SyncError>> {
            self.calls.lock().unwrap().push(call);
            let fail = self.fail.load(Ordering::SeqCst);
            let delay = *self.delay.lock().unwrap();
            Box::pin(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if fail {
                    Err(SyncError::Status(500))
                } else {
                    Ok(value)
                }
            })
        }
    }

    impl RemoteApi for FakeRemote {
        fn fetch_diaries(&self) -> BoxFuture<'_, Result<Vec<Diary>, SyncError>> {
            let diaries = self.diaries.lock().unwrap().clone();
            self.record("fetch_diaries".to_string(), diaries)
        }

        fn create_diary<'a>(
            &'a self,
            diary: &'a Diary,
            rsn: &'a str,
        ) -> BoxFuture<'a, Result<Diary, SyncError>> {
            let mut stored = diary.clone();
            stored.id = Uuid::new_v4();
            self.record(format!("create {} by {}", diary.name, rsn), stored)
        }

        fn update_diary<'a>(
            &'a self,
            diary: &'a Diary,
            rsn: &'a str,
        ) -> BoxFuture<'a, Result<Diary, SyncError>> {
            self.record(format!("update {} by {}", diary.name, rsn), diary.clone())
        }

        fn delete_diary<'a>(
            &'a self,
            id: Uuid,
            rsn: &'a str,
        ) -> BoxFuture<'a, Result<(), SyncError>> {
            self.record(format!("delete {} by {}", id, rsn), ())
        }

        fn fetch_motd(&self) -> BoxFuture<'_, Result<String, SyncError>> {
            let motd = self.motd.lock().unwrap().clone();
            self.record("fetch_motd".to_string(), motd)
        }

        fn update_motd<'a>(
            &'a self,
            motd: &'a str,
            rsn: &'a str,
        ) -> BoxFuture<'a, Result<(), SyncError>> {
            self.record(format!("motd {} by {}", motd, rsn), ())
        }
    }
}
