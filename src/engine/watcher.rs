//! Per-manifest watcher: one reconciliation run per (debounced) change
//!
//! Runs are never cancelled. Signals that arrive while a run is in flight
//! stay queued, and their debounce window opens once the run has finished.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::Settings;
use crate::engine::notification::{Notification, Report};
use crate::engine::outcome::ResultSet;
use crate::engine::reconciler::Reconciler;
use crate::engine::subscription::Subscription;

/// A completed run, handed to the notification collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub manifest_path: PathBuf,
    /// The snapshot the run was made with
    pub settings: Settings,
    pub results: ResultSet,
}

impl RunReport {
    pub fn notification(&self) -> Option<Notification> {
        Report::from_results(&self.results, &self.settings)
            .notification(&self.manifest_path.display().to_string())
    }
}

#[derive(Debug)]
enum Command {
    Check,
    Dispose,
}

/// How a debounce window ended
enum Settled {
    /// Quiet for the whole window
    Elapsed,
    /// `check()` was requested during the window
    Forced,
    Disposed,
}

/// Watches one manifest and reconciles it on every debounced change
pub struct ManifestWatcher {
    manifest_path: PathBuf,
    settings: watch::Sender<Settings>,
    commands: mpsc::UnboundedSender<Command>,
    disposed: Arc<AtomicBool>,
}

impl ManifestWatcher {
    /// Start watching. Triggers one run immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        manifest_path: impl Into<PathBuf>,
        settings: Settings,
        subscription: Subscription,
        reconciler: Arc<Reconciler>,
        debounce: Duration,
        reports: mpsc::UnboundedSender<RunReport>,
    ) -> Self {
        let manifest_path = manifest_path.into();
        let (settings_tx, settings_rx) = watch::channel(settings);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let disposed = Arc::new(AtomicBool::new(false));

        let task = WatchTask {
            manifest_path: manifest_path.clone(),
            settings: settings_rx,
            commands: commands_rx,
            subscription,
            subscription_open: true,
            reconciler,
            debounce,
            reports,
            disposed: disposed.clone(),
        };
        tokio::spawn(task.run());

        Self {
            manifest_path,
            settings: settings_tx,
            commands: commands_tx,
            disposed,
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The snapshot the next run will use
    pub fn settings(&self) -> Settings {
        *self.settings.borrow()
    }

    /// Replace the settings snapshot; takes effect on the next run.
    pub fn update_settings(&self, settings: Settings) {
        self.settings.send_replace(settings);
    }

    /// Run now, bypassing the debounce window.
    pub fn check(&self) {
        if self.is_disposed() {
            return;
        }
        let _ = self.commands.send(Command::Check);
    }

    /// Stop watching and release the subscription. Idempotent.
    ///
    /// A run already in flight completes, but its report is discarded.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Disposing watcher for {:?}", self.manifest_path);
        let _ = self.commands.send(Command::Dispose);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for ManifestWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// State owned by the background task
struct WatchTask {
    manifest_path: PathBuf,
    settings: watch::Receiver<Settings>,
    commands: mpsc::UnboundedReceiver<Command>,
    subscription: Subscription,
    subscription_open: bool,
    reconciler: Arc<Reconciler>,
    debounce: Duration,
    reports: mpsc::UnboundedSender<RunReport>,
    disposed: Arc<AtomicBool>,
}

impl WatchTask {
    async fn run(mut self) {
        info!("Watching {:?}", self.manifest_path);
        self.reconcile().await;

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Check) => self.reconcile().await,
                    Some(Command::Dispose) | None => break,
                },
                signal = self.subscription.recv(), if self.subscription_open => {
                    if signal.is_none() {
                        debug!("Change subscription for {:?} ended", self.manifest_path);
                        self.subscription_open = false;
                        continue;
                    }
                    match self.settle().await {
                        Settled::Elapsed | Settled::Forced => self.reconcile().await,
                        Settled::Disposed => break,
                    }
                },
            }
        }

        self.subscription.close();
        info!("Stopped watching {:?}", self.manifest_path);
    }

    /// Wait until no signal has arrived for a full debounce window
    async fn settle(&mut self) -> Settled {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Check) => return Settled::Forced,
                    Some(Command::Dispose) | None => return Settled::Disposed,
                },
                signal = self.subscription.recv(), if self.subscription_open => {
                    if signal.is_none() {
                        self.subscription_open = false;
                    }
                    debug!("Change to {:?} restarts debounce window", self.manifest_path);
                },
                _ = sleep(self.debounce) => return Settled::Elapsed,
            }
        }
    }

    async fn reconcile(&self) {
        // One consistent snapshot for the whole run
        let settings = *self.settings.borrow();

        let results = self.reconciler.run(&self.manifest_path, &settings).await;

        if self.disposed.load(Ordering::SeqCst) {
            debug!(
                "Discarding results for {:?}: watcher disposed",
                self.manifest_path
            );
            return;
        }

        let report = RunReport {
            manifest_path: self.manifest_path.clone(),
            settings,
            results,
        };
        if self.reports.send(report).is_err() {
            debug!("No receiver for reports of {:?}", self.manifest_path);
        }
    }
}
