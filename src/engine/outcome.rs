//! Per-dependency verdicts produced by one reconciliation run

use crate::parser::types::{DependencyDeclaration, DependencyKind};

/// Verdict for one declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOutcome {
    pub name: String,
    pub version_range: String,
    pub kind: DependencyKind,
    /// Exact installed version, if installed
    pub local_version: Option<String>,
    /// Not installed, or installed but outside the declared range
    pub local_outdated: bool,
    pub npm_version_latest: Option<String>,
    pub npm_version_beta: Option<String>,
    /// The registry version the verdict was made against
    pub npm_version: Option<String>,
    /// A newer in-range version is published
    pub outdated: bool,
    /// Only an upgrade that leaves the declared range is published
    pub outdated_not_wanted: bool,
}

impl DependencyOutcome {
    /// An outcome carrying only the declaration, before any lookup
    pub fn declared(declaration: &DependencyDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            version_range: declaration.version_range.clone(),
            kind: declaration.kind,
            local_version: None,
            local_outdated: false,
            npm_version_latest: None,
            npm_version_beta: None,
            npm_version: None,
            outdated: false,
            outdated_not_wanted: false,
        }
    }

    pub fn is_dev(&self) -> bool {
        self.kind == DependencyKind::Development
    }
}

/// Ordered outcomes of one run, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    outcomes: Vec<DependencyOutcome>,
}

impl ResultSet {
    pub fn new(outcomes: Vec<DependencyOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DependencyOutcome> {
        self.outcomes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&DependencyOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }

    /// Dependencies that are missing or installed outside their range
    pub fn unresolved(&self) -> impl Iterator<Item = &DependencyOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.local_outdated)
    }

    /// Dependencies with a newer in-range version published
    pub fn outdated(&self) -> impl Iterator<Item = &DependencyOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.outdated)
    }

    /// Dependencies whose only upgrade leaves the declared range
    pub fn updates(&self) -> impl Iterator<Item = &DependencyOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.outdated_not_wanted)
    }

    pub fn into_vec(self) -> Vec<DependencyOutcome> {
        self.outcomes
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a DependencyOutcome;
    type IntoIter = std::slice::Iter<'a, DependencyOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

impl FromIterator<DependencyOutcome> for ResultSet {
    fn from_iter<I: IntoIterator<Item = DependencyOutcome>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
