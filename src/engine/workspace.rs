//! Coordinator for the watchers of several project roots

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{Settings, WatchConfig};
use crate::engine::reconciler::Reconciler;
use crate::engine::subscription::Subscription;
use crate::engine::watcher::{ManifestWatcher, RunReport};

/// Manifest file looked up in each project root
pub const MANIFEST_FILE: &str = "package.json";

/// Creates the change subscription for a manifest path
pub type SubscribeFn = Box<dyn Fn(&Path) -> Subscription + Send + Sync>;

/// Owns one [`ManifestWatcher`] per project root, keyed by the root path
pub struct Workspace {
    reconciler: Arc<Reconciler>,
    settings: Settings,
    debounce: Duration,
    subscribe: SubscribeFn,
    reports: mpsc::UnboundedSender<RunReport>,
    watchers: HashMap<PathBuf, ManifestWatcher>,
}

impl Workspace {
    /// Create a workspace whose watchers poll their manifests
    pub fn new(
        reconciler: Arc<Reconciler>,
        settings: Settings,
        watch: WatchConfig,
        reports: mpsc::UnboundedSender<RunReport>,
    ) -> Self {
        let period = Duration::from_millis(watch.poll_interval_ms);
        Self::with_subscriber(
            reconciler,
            settings,
            Duration::from_millis(watch.debounce_ms),
            Box::new(move |path| Subscription::poll(path, period)),
            reports,
        )
    }

    pub fn with_subscriber(
        reconciler: Arc<Reconciler>,
        settings: Settings,
        debounce: Duration,
        subscribe: SubscribeFn,
        reports: mpsc::UnboundedSender<RunReport>,
    ) -> Self {
        Self {
            reconciler,
            settings,
            debounce,
            subscribe,
            reports,
            watchers: HashMap::new(),
        }
    }

    /// Reconcile the watched roots with `project_paths`: start watching new
    /// roots that contain a manifest, dispose the ones no longer listed.
    pub fn set_project_paths<I>(&mut self, project_paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let wanted: HashSet<PathBuf> = project_paths.into_iter().collect();

        self.watchers.retain(|root, watcher| {
            let keep = wanted.contains(root);
            if !keep {
                info!("Project {:?} removed", root);
                watcher.dispose();
            }
            keep
        });

        for root in wanted {
            if self.watchers.contains_key(&root) {
                continue;
            }

            let manifest = root.join(MANIFEST_FILE);
            if !manifest.is_file() {
                debug!("No {} in {:?}, not watching", MANIFEST_FILE, root);
                continue;
            }

            let watcher = ManifestWatcher::spawn(
                &manifest,
                self.settings,
                (self.subscribe)(&manifest),
                self.reconciler.clone(),
                self.debounce,
                self.reports.clone(),
            );
            self.watchers.insert(root, watcher);
        }
    }

    /// Broadcast a new settings snapshot to every watcher
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        for watcher in self.watchers.values() {
            watcher.update_settings(settings);
        }
    }

    /// Force an immediate run for every watched manifest
    pub fn check_all(&self) {
        for watcher in self.watchers.values() {
            watcher.check();
        }
    }

    /// Dispose and forget every watcher
    pub fn dispose_all(&mut self) {
        for (_, watcher) in self.watchers.drain() {
            watcher.dispose();
        }
    }

    pub fn is_watching(&self, project_root: &Path) -> bool {
        self.watchers.contains_key(project_root)
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
