//! Change subscriptions for watched manifests
//!
//! A [`Subscription`] is the receiving end of "this manifest changed"
//! signals. Where the signals come from is up to the caller: an existing
//! event source can feed [`Subscription::channel`], or
//! [`Subscription::poll`] can watch the file's metadata.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

/// Pending signals beyond this are dropped; the watcher coalesces them anyway
const SIGNAL_BUFFER: usize = 16;

/// "The manifest at this path was modified"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

/// Receiving end of a manifest's change signals
///
/// Closing is idempotent and also happens on drop.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<ChangeSignal>,
    producer: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Create a subscription fed by the returned sender
    pub fn channel() -> (mpsc::Sender<ChangeSignal>, Self) {
        let (sender, receiver) = mpsc::channel(SIGNAL_BUFFER);
        (
            sender,
            Self {
                receiver,
                producer: None,
            },
        )
    }

    /// Watch `path` by comparing its modification time and size every `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn poll(path: impl Into<PathBuf>, period: Duration) -> Self {
        let path = path.into();
        let (sender, receiver) = mpsc::channel(SIGNAL_BUFFER);

        let producer = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            let mut last = fingerprint(&path).await;
            loop {
                ticker.tick().await;

                let current = fingerprint(&path).await;
                if current == last {
                    continue;
                }
                trace!("{:?} changed: {:?} -> {:?}", path, last, current);
                last = current;

                match sender.try_send(ChangeSignal) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            debug!("Stopped polling {:?}", path);
        });

        Self {
            receiver,
            producer: Some(producer),
        }
    }

    /// Wait for the next signal. Returns `None` once closed and drained.
    pub async fn recv(&mut self) -> Option<ChangeSignal> {
        self.receiver.recv().await
    }

    /// Release the subscription. Safe to call any number of times.
    pub fn close(&mut self) {
        self.receiver.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Modification time and length; `None` while the file does not exist
async fn fingerprint(path: &Path) -> Option<(Option<SystemTime>, u64)> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    Some((metadata.modified().ok(), metadata.len()))
}
