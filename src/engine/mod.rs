//! Reconciliation layer
//!
//! Turns a manifest into a classified [`outcome::ResultSet`] and keeps
//! doing so as the manifest changes.
//!
//! ```text
//! change signal ─▶ ManifestWatcher (debounce) ─▶ Reconciler::run ─▶ RunReport
//!                        ▲                             │
//!                   Workspace                 Local + Registry (parallel)
//! ```
//!
//! - [`reconciler`]: one run over a manifest
//! - [`outcome`]: per-dependency outcome and the ordered result set
//! - [`notification`]: grouping results into a user-facing message
//! - [`subscription`]: change signal sources
//! - [`watcher`]: per-manifest debounced watcher
//! - [`workspace`]: one watcher per project root

pub mod notification;
pub mod outcome;
pub mod reconciler;
pub mod subscription;
pub mod watcher;
pub mod workspace;

pub use notification::{Notification, Report, Severity};
pub use outcome::{DependencyOutcome, ResultSet};
pub use reconciler::Reconciler;
pub use subscription::{ChangeSignal, Subscription};
pub use watcher::{ManifestWatcher, RunReport};
pub use workspace::{MANIFEST_FILE, Workspace};
