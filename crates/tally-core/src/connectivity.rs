//! Online/offline signal shared by the engine and its hosts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::remote::HttpRecordService;

/// Watch-channel backed online flag.
///
/// Hosts with a platform network signal call [`Connectivity::set_online`]
/// directly; others run [`spawn_reachability_probe`].
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Update the flag; subscribers are only woken on an actual change
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "Connectivity changed");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Something that can tell whether the record service answers
pub trait HealthCheck: Send + Sync {
    fn check(&self) -> impl Future<Output = bool> + Send;
}

impl HealthCheck for HttpRecordService {
    async fn check(&self) -> bool {
        self.health().await
    }
}

/// Poll `probe` every `interval` and feed the result into `connectivity`.
///
/// The first probe runs immediately. The task ends when `token` is cancelled.
pub fn spawn_reachability_probe<H>(
    probe: Arc<H>,
    connectivity: Connectivity,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    H: HealthCheck + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    let reachable = probe.check().await;
                    connectivity.set_online(reachable);
                }
            }
        }
        tracing::debug!("Reachability probe stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    struct FlagProbe {
        up: AtomicBool,
        checks: AtomicUsize,
    }

    impl HealthCheck for FlagProbe {
        async fn check(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.up.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn set_online_only_notifies_on_change() {
        let connectivity = Connectivity::new(false);
        let mut rx = connectivity.subscribe();

        connectivity.set_online(false);
        assert!(!rx.has_changed().unwrap());

        connectivity.set_online(true);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(connectivity.is_online());
    }

    #[test]
    fn clones_share_state() {
        let connectivity = Connectivity::default();
        let clone = connectivity.clone();

        clone.set_online(true);
        assert!(connectivity.is_online());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn probe_drives_connectivity() {
        let probe = Arc::new(FlagProbe {
            up: AtomicBool::new(true),
            checks: AtomicUsize::new(0),
        });
        let connectivity = Connectivity::new(false);
        let mut rx = connectivity.subscribe();
        let token = CancellationToken::new();

        let task = spawn_reachability_probe(
            Arc::clone(&probe),
            connectivity.clone(),
            Duration::from_millis(20),
            token.clone(),
        );

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(connectivity.is_online());

        probe.up.store(false, Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(!connectivity.is_online());

        token.cancel();
        task.await.unwrap();
        assert!(probe.checks.load(Ordering::SeqCst) >= 2);
    }
}
