//! Reconciliation of declared, installed and published versions
//!
//! A run is a sequence of stages. Each stage finishes for every dependency
//! before the next begins, and each produces new values rather than
//! mutating the previous stage's records:
//!
//! ```text
//! manifest ─▶ DependencyDeclaration ─▶ LocalState ─▶ Option<DistTags> ─▶ DependencyOutcome
//!   (parse)          (node_modules, parallel)   (registry, parallel)    (channel policy)
//! ```

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::engine::outcome::{DependencyOutcome, ResultSet};
use crate::parser::package_json::PackageJsonParser;
use crate::parser::traits::Parser;
use crate::parser::types::DependencyDeclaration;
use crate::version::local::LocalResolver;
use crate::version::registry::Registry;
use crate::version::semver::{greater_than, greater_than_range, satisfies};
use crate::version::types::DistTags;

/// Result of the local stage for one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalState {
    declaration: DependencyDeclaration,
    local_version: Option<String>,
    local_outdated: bool,
    /// False when the range or the installed version cannot be parsed;
    /// such a dependency gets no registry verdict.
    comparable: bool,
}

/// Registry-derived fields of an outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RegistryVerdict {
    npm_version_latest: Option<String>,
    npm_version_beta: Option<String>,
    npm_version: Option<String>,
    outdated: bool,
    outdated_not_wanted: bool,
}

/// The registry version chosen for comparison
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    /// Satisfies the declared range
    Wanted(String),
    /// Lies above everything the declared range allows
    Unwanted(String),
}

/// Runs the reconciliation pipeline for one manifest at a time
///
/// Holds no state between runs.
pub struct Reconciler {
    parser: Arc<dyn Parser>,
    registry: Arc<dyn Registry>,
}

impl Reconciler {
    /// Create a reconciler for package.json manifests
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self::with_parser(Arc::new(PackageJsonParser::new()), registry)
    }

    pub fn with_parser(parser: Arc<dyn Parser>, registry: Arc<dyn Registry>) -> Self {
        Self { parser, registry }
    }

    /// Reconcile every dependency declared in `manifest_path`.
    ///
    /// Never fails: unreadable inputs produce fewer verdicts, not errors.
    pub async fn run(&self, manifest_path: &Path, settings: &Settings) -> ResultSet {
        let declarations = self.declarations(manifest_path, settings).await;
        if declarations.is_empty() {
            debug!("No dependencies to check in {:?}", manifest_path);
            return ResultSet::default();
        }

        let resolver = LocalResolver::for_manifest(manifest_path);
        let locals = join_all(
            declarations
                .into_iter()
                .map(|declaration| resolve_local(&resolver, declaration)),
        )
        .await;

        let dist_tags = join_all(locals.iter().map(|local| self.fetch(local))).await;

        let results: ResultSet = locals
            .into_iter()
            .zip(dist_tags)
            .map(|(local, tags)| build_outcome(local, tags.as_ref(), settings))
            .collect();

        info!(
            "Checked {} dependencies in {:?}: {} unresolved, {} outdated, {} updates",
            results.len(),
            manifest_path,
            results.unresolved().count(),
            results.outdated().count(),
            results.updates().count()
        );

        results
    }

    async fn declarations(
        &self,
        manifest_path: &Path,
        settings: &Settings,
    ) -> Vec<DependencyDeclaration> {
        let content = match tokio::fs::read_to_string(manifest_path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read manifest {:?}: {}", manifest_path, e);
                return Vec::new();
            }
        };

        self.parser
            .parse(&content)
            .inspect_err(|e| warn!("Failed to parse manifest {:?}: {}", manifest_path, e))
            .unwrap_or_default()
            .into_iter()
            .filter(|declaration| settings.check_dev_dependencies || !declaration.is_dev())
            .collect()
    }

    /// Registry stage for one dependency; skipped when nothing is installed
    async fn fetch(&self, local: &LocalState) -> Option<DistTags> {
        local.local_version.as_ref()?;

        let name = &local.declaration.name;
        self.registry
            .fetch_dist_tags(name)
            .await
            .inspect_err(|e| warn!("Failed to fetch dist-tags for {}: {}", name, e))
            .ok()
    }
}

async fn resolve_local(resolver: &LocalResolver, declaration: DependencyDeclaration) -> LocalState {
    let Some(local_version) = resolver.resolve(&declaration.name).await else {
        return LocalState {
            declaration,
            local_version: None,
            local_outdated: true,
            comparable: false,
        };
    };

    let (local_outdated, comparable) =
        match satisfies(&local_version, &declaration.version_range) {
            Ok(in_range) => (!in_range, true),
            Err(e) => {
                warn!("Skipping comparison for {}: {}", declaration.name, e);
                (false, false)
            }
        };

    LocalState {
        declaration,
        local_version: Some(local_version),
        local_outdated,
        comparable,
    }
}

fn build_outcome(
    local: LocalState,
    dist_tags: Option<&DistTags>,
    settings: &Settings,
) -> DependencyOutcome {
    let verdict = dist_tags
        .map(|tags| judge(&local, tags, settings.use_beta_channel))
        .unwrap_or_default();

    DependencyOutcome {
        local_version: local.local_version,
        local_outdated: local.local_outdated,
        npm_version_latest: verdict.npm_version_latest,
        npm_version_beta: verdict.npm_version_beta,
        npm_version: verdict.npm_version,
        outdated: verdict.outdated,
        outdated_not_wanted: verdict.outdated_not_wanted,
        ..DependencyOutcome::declared(&local.declaration)
    }
}

/// Apply the channel policy: `latest` first, then `beta` if enabled.
/// A satisfying channel always beats one that leaves the range; among
/// satisfying channels the first evaluated wins.
fn judge(local: &LocalState, tags: &DistTags, use_beta: bool) -> RegistryVerdict {
    let mut verdict = RegistryVerdict {
        npm_version_latest: tags.latest.clone(),
        npm_version_beta: tags.beta.clone().filter(|_| use_beta),
        ..RegistryVerdict::default()
    };

    let Some(local_version) = local.local_version.as_deref().filter(|_| local.comparable) else {
        return verdict;
    };

    let range = &local.declaration.version_range;
    let channels = [verdict.npm_version_latest.as_deref(), verdict.npm_version_beta.as_deref()];

    let mut selection: Option<Selection> = None;
    for candidate in channels.into_iter().flatten() {
        if matches!(selection, Some(Selection::Wanted(_))) {
            break;
        }

        match satisfies(candidate, range) {
            Ok(true) => selection = Some(Selection::Wanted(candidate.to_string())),
            Ok(false) if selection.is_none() => match greater_than_range(candidate, range) {
                Ok(true) => selection = Some(Selection::Unwanted(candidate.to_string())),
                Ok(false) => {}
                Err(e) => warn!("Skipping {} for {}: {}", candidate, local.declaration.name, e),
            },
            Ok(false) => {}
            Err(e) => warn!("Skipping {} for {}: {}", candidate, local.declaration.name, e),
        }
    }

    match selection {
        Some(Selection::Wanted(version)) => {
            verdict.outdated = greater_than(&version, local_version)
                .inspect_err(|e| warn!("Skipping comparison for {}: {}", local.declaration.name, e))
                .unwrap_or(false);
            verdict.npm_version = Some(version);
        }
        Some(Selection::Unwanted(version)) => {
            verdict.outdated_not_wanted = true;
            verdict.npm_version = Some(version);
        }
        None => {}
    }

    verdict
}
