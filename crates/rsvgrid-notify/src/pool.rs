//! Bounded worker pool behind the [`Notifier`] seam.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rsvgrid_coord::{Notifier, Peer, PeerMessage};

use crate::client::{PeerClient, deliver, peer_client};
use crate::error::NotifyError;

/// Tuning for the notification pool.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Per-call timeout.
    pub timeout: Duration,
    /// Number of concurrent delivery tasks.
    pub workers: usize,
    /// Messages waiting for a worker before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            workers: 8,
            queue_capacity: 1024,
        }
    }
}

struct Job {
    peer: Peer,
    message: PeerMessage,
}

/// Fire-and-forget HTTP notifier.
///
/// `notify` never blocks and never fails: a full queue drops the message
/// with a warning.
pub struct HttpNotifier {
    tx: mpsc::Sender<Job>,
}

/// Handle to the pool's worker tasks.
///
/// Workers exit once every [`HttpNotifier`] is dropped and the queue drains.
pub struct NotifierHandle {
    workers: Vec<JoinHandle<()>>,
}

impl HttpNotifier {
    /// Start the worker pool. Must be called from within a tokio runtime.
    pub fn spawn(config: NotifierConfig) -> (Self, NotifierHandle) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let client = peer_client();

        let workers = (0..config.workers.max(1))
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    client.clone(),
                    Arc::clone(&rx),
                    config.timeout,
                ))
            })
            .collect::<Vec<_>>();

        info!(
            workers = workers.len(),
            queue_capacity = config.queue_capacity,
            timeout = ?config.timeout,
            "peer notifier started"
        );

        (Self { tx }, NotifierHandle { workers })
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, peer: &Peer, message: PeerMessage) {
        let kind = message.kind();
        let job = Job {
            peer: peer.clone(),
            message,
        };

        let err = match self.tx.try_send(job) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(job)) => NotifyError::Saturated { peer: job.peer.id },
            Err(mpsc::error::TrySendError::Closed(job)) => NotifyError::Stopped { peer: job.peer.id },
        };
        warn!(kind, error = %err, "peer notification dropped");
    }
}

impl NotifierHandle {
    /// Wait for workers to finish in-flight deliveries, aborting any still
    /// running after `grace`.
    pub async fn drain(self, grace: Duration) {
        let deadline = tokio::time::Instant::now() + grace;
        for mut worker in self.workers {
            if tokio::time::timeout_at(deadline, &mut worker).await.is_err() {
                worker.abort();
            }
        }
        debug!("peer notifier stopped");
    }
}

async fn run_worker(
    index: usize,
    client: PeerClient,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    timeout: Duration,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            break;
        };

        if let Err(e) = deliver(&client, &job.peer, &job.message, timeout).await {
            warn!(
                worker = index,
                peer = %job.peer.id,
                kind = job.message.kind(),
                error = %e,
                "peer notification failed"
            );
        }
    }
    debug!(worker = index, "notifier worker exiting");
}
